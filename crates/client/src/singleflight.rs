//! Single-flight request coalescing.
//!
//! At most one in-flight retrieval exists per cache key; callers that
//! arrive while one is outstanding await the same shared outcome via a
//! [`Shared`] future instead of triggering a second request. This is
//! what prevents request storms when many consumers ask for the same
//! endpoint during initial load.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use marketdeck_core::Error;

type Flight<T> = Shared<BoxFuture<'static, Result<T, Error>>>;

/// Coordinator deduplicating concurrent retrievals by key.
///
/// A flight ticket is registered when a retrieval starts and removed
/// unconditionally when it settles, success or failure, so a later
/// call for the same key starts a fresh attempt.
pub struct SingleFlight<T: Clone + Send + Sync + 'static> {
    flights: Arc<Mutex<HashMap<String, Flight<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self { flights: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl<T: Clone + Send + Sync + 'static> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self { flights: Arc::clone(&self.flights) }
    }
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight retrieval for `key`, or start one with
    /// `start`.
    ///
    /// For any key, at most one `start` future runs at a time; every
    /// concurrent caller resolves to a clone of the same outcome.
    pub async fn get_or_start<F, Fut>(&self, key: &str, start: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let flight = {
            let mut flights = self
                .flights
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);

            if let Some(existing) = flights.get(key) {
                tracing::debug!(key, "joining in-flight retrieval");
                existing.clone()
            } else {
                let flights_handle = Arc::clone(&self.flights);
                let owned_key = key.to_owned();
                let fut = start();
                let flight = async move {
                    let result = fut.await;
                    // The ticket comes off as part of the flight itself,
                    // before any awaiter observes the outcome.
                    flights_handle
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .remove(&owned_key);
                    result
                }
                .boxed()
                .shared();

                flights.insert(key.to_owned(), flight.clone());
                flight
            }
        };

        flight.await
    }

    /// Whether a retrieval for `key` is currently registered.
    pub fn in_flight(&self, key: &str) -> bool {
        self.flights
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(key)
    }
}
