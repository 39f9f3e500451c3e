//! C ABI for the engine's native plugin loader.
//!
//! Every function takes the opaque handle returned by
//! `passthrough_bridge_create`. Status codes are `0` for success and
//! `CaptureError::code()` otherwise.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::ptr;
use std::sync::OnceLock;

use jni::sys::{jint, jobject, JNI_ERR, JNI_VERSION_1_6};
use jni::JavaVM;

use passthrough_capture_core::session::bridge::PassthroughCaptureBridge;

use crate::camera_manager::AndroidCameraPlatform;
use crate::permissions::AndroidHost;
use crate::status::{copy_into, state_code, BUFFER_TOO_SMALL, INVALID_HANDLE};

static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

/// Opaque bridge handle owned by the host.
pub struct PassthroughHandle {
    bridge: PassthroughCaptureBridge<AndroidCameraPlatform>,
    host: AndroidHost,
}

#[no_mangle]
pub extern "system" fn JNI_OnLoad(vm: *mut jni::sys::JavaVM, _reserved: *mut c_void) -> jint {
    // SAFETY: the runtime passes the process VM.
    match unsafe { JavaVM::from_raw(vm) } {
        Ok(vm) => {
            let _ = JAVA_VM.set(vm);
            JNI_VERSION_1_6
        }
        Err(e) => {
            log::error!("JNI_OnLoad: {}", e);
            JNI_ERR
        }
    }
}

fn java_vm() -> Option<JavaVM> {
    let vm = JAVA_VM.get()?;
    // SAFETY: the pointer comes from a live VM registered in `JNI_OnLoad`.
    unsafe { JavaVM::from_raw(vm.get_java_vm_pointer()).ok() }
}

/// Creates a bridge bound to `activity`, or to the activity registered
/// with `ndk-context` when `activity` is null. Returns null on failure.
///
/// # Safety
///
/// `activity` must be null or a valid reference to an
/// `android.app.Activity`; a non-null `activity` requires `JNI_OnLoad` to
/// have run.
#[no_mangle]
pub unsafe extern "C" fn passthrough_bridge_create(activity: jobject) -> *mut PassthroughHandle {
    let host = if activity.is_null() {
        AndroidHost::from_ndk_context()
    } else {
        match java_vm() {
            Some(vm) => AndroidHost::from_activity(vm, activity),
            None => {
                log::error!("passthrough_bridge_create called before JNI_OnLoad");
                return ptr::null_mut();
            }
        }
    };
    let host = match host {
        Ok(host) => host,
        Err(e) => {
            log::error!("Failed to bind activity: {}", e);
            return ptr::null_mut();
        }
    };
    let platform = match AndroidCameraPlatform::new() {
        Ok(platform) => platform,
        Err(e) => {
            log::error!("Failed to create camera platform: {}", e);
            return ptr::null_mut();
        }
    };
    match PassthroughCaptureBridge::new(platform) {
        Ok(bridge) => Box::into_raw(Box::new(PassthroughHandle { bridge, host })),
        Err(e) => {
            log::error!("Failed to create capture bridge: {}", e);
            ptr::null_mut()
        }
    }
}

/// Starts capturing at `width`×`height`.
///
/// # Safety
///
/// `handle` must be null or a live handle from `passthrough_bridge_create`.
#[no_mangle]
pub unsafe extern "C" fn passthrough_bridge_start(
    handle: *mut PassthroughHandle,
    width: u32,
    height: u32,
) -> c_int {
    let Some(handle) = handle.as_ref() else {
        return INVALID_HANDLE;
    };
    match handle.bridge.start(&handle.host, width, height) {
        Ok(_) => 0,
        Err(e) => e.code(),
    }
}

/// # Safety
///
/// `handle` must be null or a live handle from `passthrough_bridge_create`.
#[no_mangle]
pub unsafe extern "C" fn passthrough_bridge_stop(handle: *mut PassthroughHandle) {
    if let Some(handle) = handle.as_ref() {
        handle.bridge.stop();
    }
}

/// Current state as a `state_code`.
///
/// # Safety
///
/// `handle` must be null or a live handle from `passthrough_bridge_create`.
#[no_mangle]
pub unsafe extern "C" fn passthrough_bridge_state(handle: *mut PassthroughHandle) -> c_int {
    let Some(handle) = handle.as_ref() else {
        return INVALID_HANDLE;
    };
    state_code(&handle.bridge.state())
}

/// Byte length of the latest frame, or `-1` when there is none.
///
/// # Safety
///
/// `handle` must be null or a live handle from `passthrough_bridge_create`.
#[no_mangle]
pub unsafe extern "C" fn passthrough_bridge_latest_frame_len(handle: *mut PassthroughHandle) -> i64 {
    let Some(handle) = handle.as_ref() else {
        return INVALID_HANDLE.into();
    };
    match handle.bridge.latest_jpeg() {
        Some(bytes) => i64::try_from(bytes.len()).unwrap_or(i64::MAX),
        None => -1,
    }
}

/// Copies the latest frame into `buf`. Returns the number of bytes written,
/// `-1` when there is no frame, or `-100` when `capacity` is too small.
///
/// # Safety
///
/// `handle` must be null or a live handle, and `buf` must be valid for
/// writes of `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn passthrough_bridge_copy_latest_frame(
    handle: *mut PassthroughHandle,
    buf: *mut u8,
    capacity: usize,
) -> i64 {
    let Some(handle) = handle.as_ref() else {
        return INVALID_HANDLE.into();
    };
    let Some(bytes) = handle.bridge.latest_jpeg() else {
        return -1;
    };
    match copy_into(&bytes, buf, capacity) {
        Some(written) => i64::try_from(written).unwrap_or(i64::MAX),
        None => BUFFER_TOO_SMALL.into(),
    }
}

/// Stops capture and frees the handle.
///
/// # Safety
///
/// `handle` must be null or a live handle; it must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn passthrough_bridge_destroy(handle: *mut PassthroughHandle) {
    if handle.is_null() {
        return;
    }
    drop(Box::from_raw(handle));
}
