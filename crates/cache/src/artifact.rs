//! Artifact trait bound for cacheable payloads.

use pagelens_core::PageAnalysis;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A payload the cache can store, export, and optionally compact.
///
/// The cache never inspects the artifact beyond these bounds; callers define
/// what an analysis result looks like.
pub trait CacheArtifact: Clone + Serialize + DeserializeOwned {
    /// Shrink the artifact in place when cache compression is enabled.
    ///
    /// Applied once at insertion time and lossy: the cache never restores
    /// what compaction removed. The default is a no-op.
    fn compact(&mut self) {}
}

impl CacheArtifact for PageAnalysis {
    fn compact(&mut self) {
        PageAnalysis::compact(self);
    }
}

/// Pre-serialized payloads pass through untouched.
impl CacheArtifact for serde_json::Value {}
