//! Cache entry, statistics, and export types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored artifact with its validity metadata.
///
/// Entries are owned exclusively by the cache; lookups hand out clones of
/// the artifact, never mutable access to stored state.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<A> {
    pub(crate) artifact: A,
    pub(crate) stored_at: DateTime<Utc>,
    /// Content fingerprint of the live document at insertion time.
    pub(crate) content_hash: String,
    pub(crate) ttl_ms: u64,
    /// Serialized size measured once at insertion, for the stats footprint.
    pub(crate) approx_bytes: usize,
}

impl<A> CacheEntry<A> {
    /// Whether the TTL has elapsed as of `now`.
    ///
    /// TTLs beyond `i64::MAX` milliseconds saturate; an oversized TTL means
    /// effectively never-expiring, not instantly expired.
    pub(crate) fn expired_at(&self, now: DateTime<Utc>) -> bool {
        let ttl = chrono::Duration::milliseconds(i64::try_from(self.ttl_ms).unwrap_or(i64::MAX));
        now.signed_duration_since(self.stored_at) > ttl
    }
}

/// Cumulative hit/miss accounting and footprint estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: usize,
    /// Sum of serialized entry sizes in bytes.
    pub approx_bytes: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache; 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

pub(crate) const EXPORT_VERSION: u32 = 1;

/// Opaque, serializable dump of all non-expired cache entries.
///
/// Produced by `ArtifactCache::export_all` and consumed by `import_all`;
/// the layout is private to the cache implementation and only guaranteed to
/// round-trip through the same version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheExport {
    pub(crate) version: u32,
    pub(crate) entries: Vec<ExportedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ExportedEntry {
    pub(crate) key: String,
    pub(crate) stored_at: DateTime<Utc>,
    pub(crate) content_hash: String,
    pub(crate) ttl_ms: u64,
    /// Artifact held as a JSON value so one corrupt payload cannot poison
    /// the whole import.
    pub(crate) artifact: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expiry_boundary() {
        let entry = CacheEntry {
            artifact: (),
            stored_at: Utc::now(),
            content_hash: "h".into(),
            ttl_ms: 1_000,
            approx_bytes: 0,
        };

        assert!(!entry.expired_at(entry.stored_at));
        assert!(!entry.expired_at(entry.stored_at + chrono::Duration::milliseconds(1_000)));
        assert!(entry.expired_at(entry.stored_at + chrono::Duration::milliseconds(1_001)));
    }

    #[test]
    fn test_oversized_ttl_saturates_instead_of_wrapping() {
        let entry = CacheEntry {
            artifact: (),
            stored_at: Utc::now(),
            content_hash: "h".into(),
            ttl_ms: u64::MAX,
            approx_bytes: 0,
        };

        assert!(!entry.expired_at(entry.stored_at));
        assert!(!entry.expired_at(entry.stored_at + chrono::Duration::days(36_500)));
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats { hits: 3, misses: 1, entry_count: 2, approx_bytes: 0 };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
