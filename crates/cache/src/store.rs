//! The artifact cache store.
//!
//! Lookup semantics, in order: lazy sweep of expired entries, absence check,
//! TTL check, then live-fingerprint comparison. TTL comes before the hash so
//! an expired entry short-circuits without touching the live document.
//! Capacity is enforced by evicting the oldest insertions first — recency of
//! use does not protect an entry, only recency of insertion does.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use pagelens_core::{CacheConfig, PageView, content_fingerprint};

use crate::artifact::CacheArtifact;
use crate::entry::{CacheEntry, CacheExport, CacheStats, EXPORT_VERSION, ExportedEntry};
use crate::error::CacheError;
use crate::key::normalize_key;

/// Bounded, TTL-and-fingerprint-validated artifact store.
///
/// One instance per tracked key space; instances share no state and need no
/// cross-instance coordination.
#[derive(Debug)]
pub struct ArtifactCache<A> {
    entries: HashMap<String, CacheEntry<A>>,
    config: CacheConfig,
    hits: u64,
    misses: u64,
}

impl<A: CacheArtifact> Default for ArtifactCache<A> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<A: CacheArtifact> ArtifactCache<A> {
    pub fn new(config: CacheConfig) -> Self {
        Self { entries: HashMap::new(), config, hits: 0, misses: 0 }
    }

    /// Look up the artifact for `resource`, validating freshness against the
    /// live document.
    ///
    /// Returns `None` (and drops the entry) when the key is absent, the TTL
    /// has elapsed, or the live content fingerprint no longer matches the
    /// one recorded at insertion. Absence is a normal result, not an error.
    pub fn get(&mut self, resource: &str, view: &dyn PageView) -> Option<A> {
        self.sweep_expired();

        let key = normalize_key(resource);
        let now = Utc::now();

        let expired = match self.entries.get(&key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => entry.expired_at(now),
        };
        if expired {
            self.entries.remove(&key);
            self.misses += 1;
            return None;
        }

        let live_hash = content_fingerprint(view);
        let stale = self.entries.get(&key).is_none_or(|entry| entry.content_hash != live_hash);
        if stale {
            tracing::debug!(key = %key, "content fingerprint mismatch, dropping stale entry");
            self.entries.remove(&key);
            self.misses += 1;
            return None;
        }

        self.hits += 1;
        self.entries.get(&key).map(|entry| entry.artifact.clone())
    }

    /// Store an artifact for `resource`, fingerprinting the live document.
    ///
    /// When compression is enabled the artifact is compacted once, here;
    /// the cache never restores what compaction removed. `ttl` falls back to
    /// the configured default. Inserting beyond capacity evicts the entries
    /// with the oldest insertion timestamps.
    pub fn set(&mut self, resource: &str, mut artifact: A, view: &dyn PageView, ttl: Option<Duration>) {
        let key = normalize_key(resource);
        let content_hash = content_fingerprint(view);

        if self.config.compression_enabled {
            artifact.compact();
        }

        let approx_bytes = match serde_json::to_vec(&artifact) {
            Ok(bytes) => bytes.len(),
            Err(error) => {
                tracing::warn!(key = %key, %error, "artifact not serializable, footprint counted as 0");
                0
            }
        };

        let ttl_ms = u64::try_from(ttl.unwrap_or_else(|| self.config.default_ttl()).as_millis()).unwrap_or(u64::MAX);

        self.entries.insert(
            key,
            CacheEntry { artifact, stored_at: Utc::now(), content_hash, ttl_ms, approx_bytes },
        );
        self.enforce_capacity();
    }

    /// Whether an unexpired entry exists for `resource`.
    ///
    /// Membership probe only: no fingerprint recomputation and no hit/miss
    /// accounting. Use `get` for the validated path.
    pub fn has(&self, resource: &str) -> bool {
        let key = normalize_key(resource);
        let now = Utc::now();
        self.entries.get(&key).is_some_and(|entry| !entry.expired_at(now))
    }

    /// Remove the entry for `resource`, returning whether one existed.
    pub fn remove(&mut self, resource: &str) -> bool {
        self.entries.remove(&normalize_key(resource)).is_some()
    }

    /// Drop all entries and reset hit/miss counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Current accounting snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entry_count: self.entries.len(),
            approx_bytes: self.entries.values().map(|entry| entry.approx_bytes).sum(),
        }
    }

    /// Serialize all non-expired entries into an opaque export blob.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Corrupt` if a stored artifact cannot be
    /// serialized; such a store should be purged via `clear`.
    pub fn export_all(&self) -> Result<CacheExport, CacheError> {
        let now = Utc::now();
        let mut entries = Vec::with_capacity(self.entries.len());

        for (key, entry) in &self.entries {
            if entry.expired_at(now) {
                continue;
            }
            let artifact = serde_json::to_value(&entry.artifact)
                .map_err(|source| CacheError::Corrupt { key: key.clone(), source })?;
            entries.push(ExportedEntry {
                key: key.clone(),
                stored_at: entry.stored_at,
                content_hash: entry.content_hash.clone(),
                ttl_ms: entry.ttl_ms,
                artifact,
            });
        }

        Ok(CacheExport { version: EXPORT_VERSION, entries })
    }

    /// Reload entries from an export blob, returning how many were imported.
    ///
    /// Each entry is re-validated against its TTL; expired entries are
    /// dropped and entries whose artifact no longer deserializes are skipped
    /// with a warning rather than failing the import. Capacity is enforced
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::UnsupportedVersion` if the blob was produced by
    /// an incompatible cache version.
    pub fn import_all(&mut self, export: CacheExport) -> Result<usize, CacheError> {
        if export.version != EXPORT_VERSION {
            return Err(CacheError::UnsupportedVersion { found: export.version, expected: EXPORT_VERSION });
        }

        let now = Utc::now();
        let mut imported = 0;

        for exported in export.entries {
            let approx_bytes = serde_json::to_vec(&exported.artifact).map(|b| b.len()).unwrap_or(0);
            let entry = CacheEntry {
                artifact: match serde_json::from_value::<A>(exported.artifact) {
                    Ok(artifact) => artifact,
                    Err(error) => {
                        tracing::warn!(key = %exported.key, %error, "skipping corrupt entry on import");
                        continue;
                    }
                },
                stored_at: exported.stored_at,
                content_hash: exported.content_hash,
                ttl_ms: exported.ttl_ms,
                approx_bytes,
            };
            if entry.expired_at(now) {
                continue;
            }
            self.entries.insert(exported.key, entry);
            imported += 1;
        }

        self.enforce_capacity();
        Ok(imported)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry whose TTL has elapsed. Runs on each `get`, so no
    /// background timer is needed.
    fn sweep_expired(&mut self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| !entry.expired_at(now));
    }

    /// Evict oldest-by-insertion entries until `max_entries` holds.
    fn enforce_capacity(&mut self) {
        while self.entries.len() > self.config.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    tracing::debug!(key = %key, "evicting oldest entry");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
