//! # passthrough-capture-android
//!
//! Android NDK Camera2 backend for `passthrough-capture-core`.
//!
//! ## Architecture
//!
//! ```text
//! passthrough-capture-android (this crate)
//! ├── camera_manager  ← AndroidCameraPlatform (ACameraManager, ACameraDevice, ACameraCaptureSession)
//! ├── image_reader    ← AndroidFrameSink (AImageReader, JPEG)
//! ├── permissions     ← AndroidHost (Activity permission checks over JNI)
//! ├── ffi             ← C ABI for the engine plugin loader
//! ├── metadata        ← metadata tags and value mappings
//! └── status          ← C ABI status codes
//! ```
//!
//! Only `metadata` and `status` build on other targets.

#[cfg(target_os = "android")]
pub mod camera_manager;
#[cfg(target_os = "android")]
pub mod error;
#[cfg(target_os = "android")]
pub mod ffi;
#[cfg(target_os = "android")]
pub mod image_reader;
pub mod metadata;
#[cfg(target_os = "android")]
pub mod permissions;
pub mod status;

#[cfg(target_os = "android")]
pub use camera_manager::{AndroidCameraDevice, AndroidCameraPlatform, AndroidCaptureSession};
#[cfg(target_os = "android")]
pub use error::NdkError;
#[cfg(target_os = "android")]
pub use image_reader::AndroidFrameSink;
#[cfg(target_os = "android")]
pub use permissions::AndroidHost;

#[cfg(target_os = "android")]
pub type AndroidPassthroughBridge =
    passthrough_capture_core::PassthroughCaptureBridge<AndroidCameraPlatform>;
