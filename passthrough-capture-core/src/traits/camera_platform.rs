use std::sync::Arc;

use crate::models::camera_models::CameraInfo;
use crate::models::config::{CaptureConfiguration, ControlMode, RequestTemplate};
use crate::models::error::CaptureError;

/// Outcome of an asynchronous device open.
#[derive(Debug)]
pub enum DeviceEvent<D> {
    /// The device is open and owned by the receiver from here on.
    Opened(D),
    /// The device went away. The receiver should release its handle.
    Disconnected,
    /// The device reported a platform error code.
    Error(i32),
}

/// Outcome of an asynchronous capture session configuration.
#[derive(Debug)]
pub enum SessionEvent<S> {
    /// The session is configured and owned by the receiver from here on.
    Configured(S),
    ConfigureFailed(String),
}

/// Delivers device events. May be invoked from any platform thread,
/// including synchronously from inside `open_device`.
pub type DeviceEventSender<D> = Arc<dyn Fn(DeviceEvent<D>) + Send + Sync + 'static>;

/// Delivers session events. Same threading rules as `DeviceEventSender`.
pub type SessionEventSender<S> = Arc<dyn Fn(SessionEvent<S>) + Send + Sync + 'static>;

/// Invoked by the frame sink whenever a new image becomes available.
///
/// Fires on the platform's image thread; keep processing minimal.
pub type FrameAvailableCallback = Arc<dyn Fn(&dyn FrameSource) + Send + Sync + 'static>;

/// The repeating request a capture session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub control_mode: ControlMode,
}

impl From<&CaptureConfiguration> for CaptureRequest {
    fn from(config: &CaptureConfiguration) -> Self {
        Self {
            template: config.template,
            control_mode: config.control_mode,
        }
    }
}

/// Entry point into a platform camera framework.
///
/// Implemented by:
/// - `AndroidCameraPlatform` (NDK Camera2)
pub trait CameraPlatform: Send + Sync + 'static {
    type Sink: FrameSink;
    type Device: CameraDevice<Sink = Self::Sink>;

    /// Identifiers of all camera devices, in platform enumeration order.
    fn camera_ids(&self) -> Result<Vec<String>, CaptureError>;

    /// Facing and capability tier of one device.
    fn camera_info(&self, id: &str) -> Result<CameraInfo, CaptureError>;

    /// Create a frame sink for the configured size, format and queue depth.
    fn create_frame_sink(
        &self,
        config: &CaptureConfiguration,
        on_frame: FrameAvailableCallback,
    ) -> Result<Self::Sink, CaptureError>;

    /// Request that a device be opened. The result arrives through `events`.
    ///
    /// An `Err` here means the request itself was refused and no event
    /// will follow.
    fn open_device(
        &self,
        id: &str,
        events: DeviceEventSender<Self::Device>,
    ) -> Result<(), CaptureError>;
}

/// An open camera device. Dropping it must close it.
pub trait CameraDevice: Send + 'static {
    type Sink: FrameSink;
    type Session: CaptureSession;

    fn id(&self) -> &str;

    /// Build a capture session whose only output is `sink`.
    /// The result arrives through `events`.
    fn create_capture_session(
        &mut self,
        sink: &Self::Sink,
        request: CaptureRequest,
        events: SessionEventSender<Self::Session>,
    ) -> Result<(), CaptureError>;

    /// Close the device. Must tolerate being called more than once.
    fn close(&mut self);
}

/// A configured capture session. Dropping it must close it.
pub trait CaptureSession: Send + 'static {
    /// Submit the session's request as a repeating request.
    fn set_repeating_request(&mut self) -> Result<(), CaptureError>;

    fn stop_repeating(&mut self) -> Result<(), CaptureError>;

    /// Close the session. Must tolerate being called more than once.
    fn close(&mut self);
}

/// Receives encoded images from the capture pipeline. Dropping it must close it.
pub trait FrameSink: Send + 'static {
    /// Close the sink. No frame callback may fire after this returns.
    fn close(&mut self);
}

/// The sink-side view handed to `FrameAvailableCallback`.
pub trait FrameSource {
    /// Acquire the newest available image, discarding older ones.
    /// `Ok(None)` when nothing is available.
    fn acquire_latest(&self) -> Result<Option<Box<dyn AcquiredFrame + '_>>, CaptureError>;
}

/// An image acquired from a frame sink. Dropping it releases the image
/// back to the sink.
pub trait AcquiredFrame {
    fn plane_count(&self) -> usize;

    /// Bytes of one plane. Valid until the frame is dropped.
    fn plane_data(&self, index: usize) -> Result<&[u8], CaptureError>;
}
