//! Cache record type with derived freshness.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A cached market-data snapshot.
///
/// Records are immutable once created: a refresh builds a new record
/// and replaces the old one in both cache layers. Freshness is derived
/// from `fetched_at` and `ttl_seconds`, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// The fetched payload, as parsed from the response body.
    pub data: serde_json::Value,

    /// Fetch time in milliseconds since the Unix epoch.
    pub fetched_at: i64,

    /// Freshness window in seconds.
    pub ttl_seconds: u64,
}

impl CacheRecord {
    /// Build a record stamped with the current wall-clock time.
    pub fn now(data: serde_json::Value, ttl_seconds: u64) -> Self {
        Self { data, fetched_at: chrono::Utc::now().timestamp_millis(), ttl_seconds }
    }

    /// Whether this record is still fresh at `now_ms`.
    ///
    /// Fresh for all instants in `[fetched_at, fetched_at + ttl_seconds * 1000)`.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.fetched_at) < self.ttl_ms()
    }

    /// Whether this record may still serve as a stale fallback at
    /// `now_ms`, i.e. its age is within `ttl_seconds` plus `grace`.
    pub fn within_grace(&self, now_ms: i64, grace: Duration) -> bool {
        let grace_ms = i64::try_from(grace.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.fetched_at) < self.ttl_ms().saturating_add(grace_ms)
    }

    /// TTL in milliseconds, clamped so oversized TTLs saturate instead
    /// of wrapping negative.
    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX).saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fetched_at: i64, ttl_seconds: u64) -> CacheRecord {
        CacheRecord { data: serde_json::json!({"price": 1.0}), fetched_at, ttl_seconds }
    }

    #[test]
    fn test_fresh_within_ttl() {
        let r = record(1_000_000, 300);
        assert!(r.is_fresh(1_000_000));
        assert!(r.is_fresh(1_000_000 + 299_999));
    }

    #[test]
    fn test_stale_at_ttl_boundary() {
        let r = record(1_000_000, 300);
        assert!(!r.is_fresh(1_000_000 + 300_000));
        assert!(!r.is_fresh(1_000_000 + 300_001));
    }

    #[test]
    fn test_within_grace() {
        let grace = Duration::from_secs(60 * 60);
        // Aged ttl + 1800s: inside the 60-minute grace window.
        let r = record(0, 300);
        assert!(r.within_grace((300 + 1800) * 1000, grace));
        // Aged ttl + 3700s: past it.
        assert!(!r.within_grace((300 + 3700) * 1000, grace));
    }

    #[test]
    fn test_oversized_ttl_saturates() {
        // A TTL too large for i64 milliseconds must stay fresh forever,
        // not wrap negative and read as expired.
        let r = record(0, u64::MAX);
        assert!(r.is_fresh(i64::MAX - 1));
        assert!(r.within_grace(i64::MAX - 1, Duration::from_secs(60 * 60)));
    }

    #[test]
    fn test_serde_round_trip() {
        let r = record(1_234, 300);
        let json = serde_json::to_string(&r).unwrap();
        let back: CacheRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
