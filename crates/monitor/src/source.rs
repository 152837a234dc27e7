//! Pluggable raw-signal sources.
//!
//! Browser-specific observation primitives (a DOM mutation feed, scroll and
//! resize listeners, history hooks) sit behind this capability interface so
//! the scheduling logic is testable by injecting synthetic signals.

use tokio::sync::mpsc;

use crate::event::{ChangeKind, SignalDetails};
use crate::monitor::TaskMessage;

/// A producer of raw observation signals for one change class.
///
/// `observe` is called when monitoring starts (if the class is enabled) and
/// hands the source a sink to emit into; `disconnect` is called when
/// monitoring stops and must tolerate being called without a prior
/// `observe`.
pub trait SignalSource: Send {
    /// Which change class this source produces.
    fn kind(&self) -> ChangeKind;

    fn observe(&mut self, sink: SignalSink);

    fn disconnect(&mut self);
}

/// Cheap clonable handle feeding raw signals into a running monitor.
///
/// Signals emitted after the monitor stops are dropped.
#[derive(Debug, Clone)]
pub struct SignalSink {
    tx: mpsc::UnboundedSender<TaskMessage>,
}

impl SignalSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<TaskMessage>) -> Self {
        Self { tx }
    }

    /// Emit one raw signal; returns false if the monitor is gone.
    pub fn emit(&self, details: SignalDetails) -> bool {
        self.tx.send(TaskMessage::Signal(details)).is_ok()
    }
}
