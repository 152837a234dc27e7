//! Change events and raw signal payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Class of observed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Structural,
    Scroll,
    Resize,
    Navigation,
}

/// Kind-specific payload of a raw observation signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalDetails {
    /// DOM mutations observed in one batch.
    Structural { mutations: u32 },
    Scroll { scroll_y: f64 },
    Resize { width: u32, height: u32 },
    /// Address change, including programmatic history updates.
    Navigation { url: String },
    /// Caller-forced re-check with no observer payload.
    Manual,
}

impl SignalDetails {
    pub fn kind(&self) -> ChangeKind {
        match self {
            SignalDetails::Structural { .. } | SignalDetails::Manual => ChangeKind::Structural,
            SignalDetails::Scroll { .. } => ChangeKind::Scroll,
            SignalDetails::Resize { .. } => ChangeKind::Resize,
            SignalDetails::Navigation { .. } => ChangeKind::Navigation,
        }
    }
}

/// One delivered change notification.
///
/// Created per raw observation, merged with any buffered peers at flush
/// time, delivered to callbacks, then discarded; events are not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub timestamp: DateTime<Utc>,
    pub details: SignalDetails,
    pub is_significant: bool,
    /// Raw significance score when one was computed for this signal.
    pub score: Option<f64>,
    /// How many raw signals were merged into this delivery.
    pub coalesced: usize,
}

impl ChangeEvent {
    pub(crate) fn from_signal(details: SignalDetails, is_significant: bool, score: Option<f64>) -> Self {
        Self {
            kind: details.kind(),
            timestamp: Utc::now(),
            details,
            is_significant,
            score,
            coalesced: 1,
        }
    }

    /// Merge buffered events into one delivery.
    ///
    /// The merged event is significant iff any input was; its kind and
    /// details come from the first significant input, else the first input.
    /// Returns `None` for an empty buffer.
    pub fn coalesce(mut events: Vec<ChangeEvent>) -> Option<ChangeEvent> {
        if events.is_empty() {
            return None;
        }

        let coalesced = events.len();
        let is_significant = events.iter().any(|event| event.is_significant);
        let lead = events.iter().position(|event| event.is_significant).unwrap_or(0);

        let mut merged = events.swap_remove(lead);
        merged.is_significant = is_significant;
        merged.timestamp = Utc::now();
        merged.coalesced = coalesced;
        Some(merged)
    }
}
