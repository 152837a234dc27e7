//! Bounded, TTL-and-fingerprint-validated artifact cache.
//!
//! Maps a normalized resource identity (URL) to a previously computed
//! analysis artifact. An entry is served only while its TTL holds *and* the
//! live document still hashes to the fingerprint recorded at insertion.
//! Capacity is bounded by insertion-order eviction, and the whole store can
//! be exported to an opaque blob and re-imported across process restarts.

pub mod artifact;
pub mod entry;
pub mod error;
pub mod key;
pub mod store;

pub use artifact::CacheArtifact;
pub use entry::{CacheExport, CacheStats};
pub use error::CacheError;
pub use key::normalize_key;
pub use store::ArtifactCache;
