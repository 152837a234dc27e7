//! Change-notification callbacks.

use crate::event::ChangeEvent;

/// Error type callbacks may return; failures are logged per-callback and
/// never block delivery to the others.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Handle for removing a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub(crate) u64);

/// Receiver of coalesced change notifications.
///
/// Implemented for free by any `FnMut(&ChangeEvent) -> Result<(), BoxError>`
/// closure; implement the trait directly for stateful receivers.
pub trait ChangeCallback: Send {
    fn on_change(&mut self, event: &ChangeEvent) -> Result<(), BoxError>;
}

impl<F> ChangeCallback for F
where
    F: FnMut(&ChangeEvent) -> Result<(), BoxError> + Send,
{
    fn on_change(&mut self, event: &ChangeEvent) -> Result<(), BoxError> {
        self(event)
    }
}
