//! Process-lifetime in-memory cache layer.
//!
//! The fastest path: a plain map from cache key to the most recently
//! observed record, populated lazily from the durable store or the
//! network. Lost on process restart by design; durability is the
//! store's job. Unbounded and without eviction; the working set is a
//! handful of distinct endpoints.

use std::collections::HashMap;
use std::sync::RwLock;

use super::record::CacheRecord;

/// In-memory map from cache key to latest record.
#[derive(Debug, Default)]
pub struct MemoryLayer {
    entries: RwLock<HashMap<String, CacheRecord>>,
}

impl MemoryLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the record for `key`, fresh or not. Freshness is the
    /// caller's concern.
    pub fn get(&self, key: &str) -> Option<CacheRecord> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Replace the record for `key`.
    pub fn set(&self, key: &str, record: CacheRecord) {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fetched_at: i64) -> CacheRecord {
        CacheRecord { data: serde_json::json!([1, 2, 3]), fetched_at, ttl_seconds: 300 }
    }

    #[test]
    fn test_absent_key() {
        let memory = MemoryLayer::new();
        assert!(memory.get("missing").is_none());
    }

    #[test]
    fn test_set_then_get() {
        let memory = MemoryLayer::new();
        memory.set("k", record(111));
        assert_eq!(memory.get("k").unwrap().fetched_at, 111);
    }

    #[test]
    fn test_set_replaces() {
        let memory = MemoryLayer::new();
        memory.set("k", record(111));
        memory.set("k", record(222));
        assert_eq!(memory.get("k").unwrap().fetched_at, 222);
    }
}
