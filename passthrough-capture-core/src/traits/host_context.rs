use crate::models::error::CaptureError;

/// The hosting application, as seen by the bridge.
///
/// Camera permission lives with the host: the bridge only asks whether it
/// is granted and, if not, asks the host to prompt for it. The prompt's
/// result is delivered to the host, never to the bridge.
pub trait HostContext {
    fn has_camera_permission(&self) -> bool;

    /// Trigger the platform permission prompt. Returns once the request is
    /// issued, not when the user answers.
    fn request_camera_permission(&self) -> Result<(), CaptureError>;
}
