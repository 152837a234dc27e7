//! Live-document change monitoring for pagelens.
//!
//! Turns a stream of raw, high-frequency observation signals (DOM mutations,
//! scrolls, resizes, navigations) into a small number of meaningful
//! "re-analyze now" notifications:
//!
//! - Significance scoring of structural changes between page snapshots
//! - Debounce + throttle coalescing of signal bursts
//! - Pluggable signal sources so scheduling is testable without a browser

pub mod callback;
pub mod event;
pub mod monitor;
pub mod significance;
pub mod source;

pub use callback::{BoxError, CallbackId, ChangeCallback};
pub use event::{ChangeEvent, ChangeKind, SignalDetails};
pub use monitor::ChangeMonitor;
pub use significance::significance;
pub use source::{SignalSink, SignalSource};
