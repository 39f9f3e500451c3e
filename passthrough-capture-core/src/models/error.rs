use thiserror::Error;

/// Errors that can occur while bringing up or running passthrough capture.
///
/// Every failure path of the capture lifecycle maps to exactly one variant,
/// whether it is returned from `start` or published asynchronously through
/// `CaptureState::Failed`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera permission not granted")]
    PermissionDenied,

    #[error("no camera devices present")]
    NoCameraDevices,

    #[error("no back-facing camera found")]
    NoBackFacingCamera,

    #[error("capture already running")]
    AlreadyRunning,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("device access failed: {0}")]
    DeviceAccess(String),

    #[error("camera disconnected")]
    DeviceDisconnected,

    #[error("camera error: {0}")]
    DeviceError(i32),

    #[error("capture session configuration failed: {0}")]
    SessionConfigurationFailed(String),

    #[error("repeating request failed: {0}")]
    RepeatingRequestFailed(String),

    #[error("failed to read frame: {0}")]
    FrameReadFailed(String),
}

/// Coarse failure taxonomy, for callers that only need to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Permission must be granted externally, then `start` re-invoked.
    Permission,
    /// No device satisfies the selection predicate.
    NoMatchingDevice,
    /// The platform reported a fault while opening or running the device.
    DeviceFault,
    /// The bridge was driven incorrectly (bad config, double start).
    Usage,
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied => ErrorKind::Permission,
            Self::NoCameraDevices | Self::NoBackFacingCamera => ErrorKind::NoMatchingDevice,
            Self::AlreadyRunning | Self::InvalidConfiguration(_) => ErrorKind::Usage,
            Self::DeviceAccess(_)
            | Self::DeviceDisconnected
            | Self::DeviceError(_)
            | Self::SessionConfigurationFailed(_)
            | Self::RepeatingRequestFailed(_)
            | Self::FrameReadFailed(_) => ErrorKind::DeviceFault,
        }
    }

    /// Stable numeric code for C callers. Success is `0`; every error is negative.
    pub fn code(&self) -> i32 {
        match self {
            Self::PermissionDenied => -1,
            Self::NoCameraDevices => -2,
            Self::NoBackFacingCamera => -3,
            Self::AlreadyRunning => -4,
            Self::InvalidConfiguration(_) => -5,
            Self::DeviceAccess(_) => -6,
            Self::DeviceDisconnected => -7,
            Self::DeviceError(_) => -8,
            Self::SessionConfigurationFailed(_) => -9,
            Self::RepeatingRequestFailed(_) => -10,
            Self::FrameReadFailed(_) => -11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy() {
        assert_eq!(CaptureError::PermissionDenied.kind(), ErrorKind::Permission);
        assert_eq!(CaptureError::NoBackFacingCamera.kind(), ErrorKind::NoMatchingDevice);
        assert_eq!(CaptureError::DeviceError(3).kind(), ErrorKind::DeviceFault);
        assert_eq!(CaptureError::AlreadyRunning.kind(), ErrorKind::Usage);
    }

    #[test]
    fn codes_are_negative_and_distinct() {
        let all = [
            CaptureError::PermissionDenied,
            CaptureError::NoCameraDevices,
            CaptureError::NoBackFacingCamera,
            CaptureError::AlreadyRunning,
            CaptureError::InvalidConfiguration(String::new()),
            CaptureError::DeviceAccess(String::new()),
            CaptureError::DeviceDisconnected,
            CaptureError::DeviceError(0),
            CaptureError::SessionConfigurationFailed(String::new()),
            CaptureError::RepeatingRequestFailed(String::new()),
            CaptureError::FrameReadFailed(String::new()),
        ];
        let mut codes: Vec<i32> = all.iter().map(|e| e.code()).collect();
        assert!(codes.iter().all(|&c| c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }
}
