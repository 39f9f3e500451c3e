//! # passthrough-capture-core
//!
//! Platform-agnostic passthrough camera bridge.
//!
//! Opens the first back-facing camera through a platform camera framework,
//! streams JPEG frames into a frame sink, and hands the most recent frame to
//! the host on demand. Platform backends (Android NDK Camera2) implement the
//! `CameraPlatform` family of traits and plug into the generic
//! `PassthroughCaptureBridge`.
//!
//! ## Architecture
//!
//! ```text
//! passthrough-capture-core (this crate)
//! ├── traits/       ← CameraPlatform, CameraDevice, CaptureSession, FrameSink, HostContext, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, CameraInfo, Frame
//! ├── processing/   ← device selection, LatestFrameSlot
//! └── session/      ← PassthroughCaptureBridge (lifecycle state machine)
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use models::camera_models::{CameraInfo, HardwareLevel, LensFacing};
pub use models::config::{CaptureConfiguration, ControlMode, ImageFormat, RequestTemplate};
pub use models::error::{CaptureError, ErrorKind};
pub use models::frame::{BridgeDiagnostics, Frame};
pub use models::state::CaptureState;
pub use processing::device_selector::{camera_inventory, camera_inventory_json, select_back_camera};
pub use processing::latest_frame::LatestFrameSlot;
pub use session::bridge::PassthroughCaptureBridge;
pub use traits::camera_platform::{
    AcquiredFrame, CameraDevice, CameraPlatform, CaptureRequest, CaptureSession, DeviceEvent,
    DeviceEventSender, FrameAvailableCallback, FrameSink, FrameSource, SessionEvent,
    SessionEventSender,
};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::host_context::HostContext;
