//! Two-layer cache for market-data snapshots.
//!
//! This module provides the storage half of the retrieval layer:
//!
//! - Canonical cache keys derived from URL + logical version
//! - `CacheRecord` with derived (never stored) freshness
//! - A process-lifetime in-memory layer for the hot path
//! - A SQLite-backed durable store with automatic schema migrations
//!
//! Freshness policy lives with the orchestrator in `marketdeck-client`;
//! these layers store and return records verbatim.

pub mod connection;
pub mod key;
pub mod memory;
pub mod migrations;
pub mod record;
pub mod records;

pub use crate::Error;

pub use connection::DurableStore;
pub use key::normalize_key;
pub use memory::MemoryLayer;
pub use record::CacheRecord;
