use ndk_sys as ffi;
use thiserror::Error;

use passthrough_capture_core::models::error::CaptureError;

/// Failures of individual NDK and JNI calls.
#[derive(Debug, Error)]
pub enum NdkError {
    #[error("{call} failed with camera status {status}")]
    Camera { call: &'static str, status: i32 },

    #[error("{call} failed with media status {status}")]
    Media { call: &'static str, status: i32 },

    #[error("JNI call failed: {0}")]
    Jni(String),

    #[error("invalid camera id {0:?}")]
    InvalidCameraId(String),
}

impl From<NdkError> for CaptureError {
    fn from(e: NdkError) -> Self {
        CaptureError::DeviceAccess(e.to_string())
    }
}

impl From<jni::errors::Error> for NdkError {
    fn from(e: jni::errors::Error) -> Self {
        NdkError::Jni(e.to_string())
    }
}

pub(crate) fn check_camera(status: ffi::camera_status_t, call: &'static str) -> Result<(), NdkError> {
    if status == ffi::camera_status_t::ACAMERA_OK {
        Ok(())
    } else {
        Err(NdkError::Camera {
            call,
            status: status.0,
        })
    }
}

pub(crate) fn check_media(status: ffi::media_status_t, call: &'static str) -> Result<(), NdkError> {
    if status == ffi::media_status_t::AMEDIA_OK {
        Ok(())
    } else {
        Err(NdkError::Media {
            call,
            status: status.0,
        })
    }
}
