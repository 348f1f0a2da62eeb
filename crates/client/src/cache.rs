//! Fetch-with-cache orchestrator.
//!
//! The policy engine composing the cache layers and the network, in
//! strict precedence order:
//!
//! 1. Fresh in-memory record: returned immediately, no I/O.
//! 2. Fresh durable record: returned immediately, memory populated,
//!    and a detached background refresh spawned (stale-while-
//!    revalidate: the caller never waits on the network when any
//!    fresh copy exists).
//! 3. Coalesced network fetch through the single-flight coordinator;
//!    on success the new record is written to both layers.
//! 4. On fetch failure, the last-known-good durable record is served
//!    as long as its age is within TTL plus a fixed grace window;
//!    otherwise the failure propagates.
//!
//! Layer writes are idempotent whole-record replacements, so the
//! background refresh and a foreground fetch are safe to race.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use marketdeck_core::{CacheRecord, DurableStore, Error, MemoryLayer, normalize_key};

use crate::fetch::{FetchClient, FetchConfig, Fetcher};
use crate::singleflight::SingleFlight;

/// Extra time beyond TTL during which a stale record may still be
/// served after a failed refresh attempt.
const GRACE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Per-call retrieval options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Freshness window in seconds (default: 300).
    pub ttl_seconds: u64,

    /// Cache-format version tag (default: "1"). Bumping it changes the
    /// cache key, so records of an old shape are never read back.
    pub version: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { ttl_seconds: 300, version: "1".to_string() }
    }
}

/// Where a returned record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Memory,
    Durable,
    Network,
    Stale,
}

/// Result of a cached retrieval.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub data: serde_json::Value,
    pub source: Source,
    /// Fetch time of the underlying record, ms since epoch.
    pub fetched_at: i64,
}

impl CachedResponse {
    fn from_record(record: CacheRecord, source: Source) -> Self {
        Self { data: record.data, source, fetched_at: record.fetched_at }
    }
}

/// Cached market-data retrieval pipeline.
///
/// Constructed once per process and shared by all consumers; clones
/// share the same layers and in-flight table.
pub struct MarketCache {
    memory: Arc<MemoryLayer>,
    store: DurableStore,
    flights: SingleFlight<CacheRecord>,
    fetcher: Arc<dyn Fetcher>,
}

impl Clone for MarketCache {
    fn clone(&self) -> Self {
        Self {
            memory: Arc::clone(&self.memory),
            store: self.store.clone(),
            flights: self.flights.clone(),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl MarketCache {
    pub fn new(store: DurableStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            memory: Arc::new(MemoryLayer::new()),
            store,
            flights: SingleFlight::new(),
            fetcher,
        }
    }

    /// Open a durable store at `path` and wire it to an HTTP fetcher.
    pub async fn open(path: impl AsRef<std::path::Path>, config: FetchConfig) -> Result<Self, Error> {
        let store = DurableStore::open(path).await?;
        let fetcher = Arc::new(FetchClient::new(config)?);
        Ok(Self::new(store, fetcher))
    }

    /// Retrieve the data for `url`, serving from the freshest available
    /// layer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FetchFailed`] only when the network attempt
    /// fails and no durable record is within the grace window. All
    /// storage and normalization faults are absorbed by the layers
    /// where they occur.
    pub async fn fetch_with_cache(&self, url: &str, options: &FetchOptions) -> Result<CachedResponse, Error> {
        let key = normalize_key(url, &options.version);
        let now = chrono::Utc::now().timestamp_millis();

        let in_memory = self.memory.get(&key);
        if let Some(record) = &in_memory
            && record.is_fresh(now)
        {
            tracing::debug!(%key, "memory cache hit");
            return Ok(CachedResponse::from_record(record.clone(), Source::Memory));
        }

        let durable = self.store.read(&key).await;
        if let Some(record) = &durable
            && record.is_fresh(now)
        {
            tracing::debug!(%key, "durable cache hit, revalidating in background");
            self.memory.set(&key, record.clone());
            self.spawn_refresh(key, url.to_owned(), options.clone(), record.fetched_at);
            return Ok(CachedResponse::from_record(record.clone(), Source::Durable));
        }

        // The newest record this caller has seen. A flight for the same
        // key can settle and drop its ticket while we were suspended on
        // the durable read; anything newer than this in memory is that
        // flight's result and must not trigger a second fetch.
        let observed = in_memory
            .as_ref()
            .map(|r| r.fetched_at)
            .max(durable.as_ref().map(|r| r.fetched_at))
            .unwrap_or(i64::MIN);

        match self.fetch_and_store(&key, url, options.ttl_seconds, observed).await {
            Ok(record) => Ok(CachedResponse::from_record(record, Source::Network)),
            Err(err) => {
                if let Some(record) = durable
                    && record.within_grace(now, GRACE_WINDOW)
                {
                    tracing::warn!(%key, error = %err, "network fetch failed, serving stale record");
                    return Ok(CachedResponse::from_record(record, Source::Stale));
                }
                Err(Error::FetchFailed(err.to_string()))
            }
        }
    }

    /// Coalesced network fetch that updates both layers on success.
    ///
    /// Shared by the foreground miss path and the background refresh,
    /// so a refresh storm collapses into the same flight as any
    /// concurrent foreground fetch. `observed_fetched_at` is the
    /// `fetched_at` of the newest record the caller saw before
    /// delegating here: if memory holds anything newer by the time the
    /// flight runs, that record is another flight's settled result and
    /// is returned as-is instead of fetching again.
    async fn fetch_and_store(
        &self,
        key: &str,
        url: &str,
        ttl_seconds: u64,
        observed_fetched_at: i64,
    ) -> Result<CacheRecord, Error> {
        let this = self.clone();
        let owned_key = key.to_owned();
        let url = url.to_owned();

        self.flights
            .get_or_start(key, move || async move {
                if let Some(record) = this.memory.get(&owned_key)
                    && record.fetched_at > observed_fetched_at
                {
                    tracing::debug!(key = %owned_key, "record landed while joining, skipping fetch");
                    return Ok(record);
                }

                let data = this.fetcher.fetch_json(&url).await?;
                let record = CacheRecord::now(data, ttl_seconds);
                this.memory.set(&owned_key, record.clone());
                this.store.write(&owned_key, &record).await;
                Ok(record)
            })
            .await
    }

    /// Fire-and-forget revalidation; failures only affect future calls
    /// and are never surfaced to the caller that triggered them.
    ///
    /// `stale_fetched_at` is the `fetched_at` of the record that
    /// triggered the refresh, so the refresh itself still fetches (the
    /// record it saw is not newer than that) while a refresh racing an
    /// already-landed replacement backs off.
    fn spawn_refresh(&self, key: String, url: String, options: FetchOptions, stale_fetched_at: i64) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.fetch_and_store(&key, &url, options.ttl_seconds, stale_fetched_at).await {
                tracing::debug!(%key, error = %err, "background refresh failed");
            }
        });
    }
}
