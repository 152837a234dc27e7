//! Cache error types.
//!
//! Absence and staleness are normal `Option` results, not errors; only
//! export/import surface failures.

/// Errors from cache export and import.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A stored artifact could not be serialized for export.
    #[error("corrupt cache entry for {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The export blob was produced by an incompatible cache version.
    #[error("unsupported cache export version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}
