//! Retrieval layer for marketdeck.
//!
//! This crate provides the cached data-retrieval pipeline consumed by
//! presentation code: an HTTP fetch client, single-flight request
//! coalescing, and the fetch-with-cache orchestrator with
//! stale-while-revalidate and last-known-good fallback.

pub mod cache;
pub mod extract;
pub mod fetch;
pub mod singleflight;

pub use cache::{CachedResponse, FetchOptions, MarketCache, Source};
pub use extract::extract_market_cap;
pub use fetch::{FetchClient, FetchConfig, Fetcher};
pub use singleflight::SingleFlight;
