//! Core types and shared functionality for pagelens.
//!
//! This crate provides:
//! - The `PageView` abstraction over a live document
//! - Structural page snapshots for change detection
//! - Canonical content fingerprinting for cache invalidation
//! - Configuration structures with layered loading

pub mod analysis;
pub mod config;
pub mod fingerprint;
pub mod page;
pub mod snapshot;

pub use analysis::PageAnalysis;
pub use config::{AppConfig, CacheConfig, MonitorConfig};
pub use fingerprint::content_fingerprint;
pub use page::{PageView, StaticPage};
pub use snapshot::PageSnapshot;
