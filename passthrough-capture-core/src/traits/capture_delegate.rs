use crate::models::error::CaptureError;
use crate::models::state::CaptureState;

/// Event delegate for bridge notifications.
///
/// Called from the bridge's callback thread or from the thread that called
/// `start`/`stop`, never while the bridge holds its internal lock. It is safe
/// to call back into the bridge from these methods.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the lifecycle state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when an asynchronous step of the lifecycle fails.
    fn on_error(&self, error: &CaptureError);
}
