//! NDK Camera2 platform: device enumeration, device open, capture sessions.
//!
//! Wraps `ACameraManager`, `ACameraDevice` and `ACameraCaptureSession`.
//! Open and session creation are synchronous in the NDK; their results are
//! still delivered through the event senders, so the bridge drives them the
//! same way as asynchronous callbacks.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;
use std::sync::Arc;

use ndk_sys as ffi;

use passthrough_capture_core::models::camera_models::CameraInfo;
use passthrough_capture_core::models::config::{CaptureConfiguration, RequestTemplate};
use passthrough_capture_core::models::error::CaptureError;
use passthrough_capture_core::traits::camera_platform::{
    CameraDevice, CameraPlatform, CaptureRequest, CaptureSession, DeviceEvent, DeviceEventSender,
    FrameAvailableCallback, SessionEvent, SessionEventSender,
};

use crate::error::{check_camera, NdkError};
use crate::image_reader::AndroidFrameSink;
use crate::metadata::{
    control_mode_value, hardware_level, lens_facing, ACAMERA_CONTROL_MODE,
    ACAMERA_INFO_SUPPORTED_HARDWARE_LEVEL, ACAMERA_LENS_FACING,
};

/// Owned `ACameraManager`, shared by the platform and every device it opens.
struct CameraManager {
    ptr: *mut ffi::ACameraManager,
}

// SAFETY: `ACameraManager` is documented as thread-safe.
unsafe impl Send for CameraManager {}
unsafe impl Sync for CameraManager {}

impl Drop for CameraManager {
    fn drop(&mut self) {
        unsafe { ffi::ACameraManager_delete(self.ptr) };
    }
}

/// Camera platform backed by the NDK camera service.
pub struct AndroidCameraPlatform {
    manager: Arc<CameraManager>,
}

impl AndroidCameraPlatform {
    pub fn new() -> Result<Self, CaptureError> {
        let ptr = unsafe { ffi::ACameraManager_create() };
        if ptr.is_null() {
            return Err(CaptureError::DeviceAccess("camera service unavailable".into()));
        }
        Ok(Self {
            manager: Arc::new(CameraManager { ptr }),
        })
    }

    fn characteristic_u8(&self, id: &CStr, tag: u32) -> Result<Option<u8>, NdkError> {
        let mut metadata = ptr::null_mut();
        unsafe {
            check_camera(
                ffi::ACameraManager_getCameraCharacteristics(
                    self.manager.ptr,
                    id.as_ptr(),
                    &mut metadata,
                ),
                "ACameraManager_getCameraCharacteristics",
            )?;

            let mut entry: ffi::ACameraMetadata_const_entry = std::mem::zeroed();
            let status = ffi::ACameraMetadata_getConstEntry(metadata, tag, &mut entry);
            let value = if status == ffi::camera_status_t::ACAMERA_OK && entry.count > 0 {
                Some(*entry.data.u8_)
            } else {
                None
            };
            ffi::ACameraMetadata_free(metadata);
            Ok(value)
        }
    }
}

fn camera_id(id: &str) -> Result<CString, NdkError> {
    CString::new(id).map_err(|_| NdkError::InvalidCameraId(id.to_string()))
}

impl CameraPlatform for AndroidCameraPlatform {
    type Sink = AndroidFrameSink;
    type Device = AndroidCameraDevice;

    fn camera_ids(&self) -> Result<Vec<String>, CaptureError> {
        let mut list: *mut ffi::ACameraIdList = ptr::null_mut();
        unsafe {
            check_camera(
                ffi::ACameraManager_getCameraIdList(self.manager.ptr, &mut list),
                "ACameraManager_getCameraIdList",
            )?;

            let count = usize::try_from((*list).numCameras).unwrap_or(0);
            let mut ids = Vec::with_capacity(count);
            for i in 0..count {
                let raw: *const c_char = *(*list).cameraIds.add(i);
                if !raw.is_null() {
                    ids.push(CStr::from_ptr(raw).to_string_lossy().into_owned());
                }
            }
            ffi::ACameraManager_deleteCameraIdList(list);
            Ok(ids)
        }
    }

    fn camera_info(&self, id: &str) -> Result<CameraInfo, CaptureError> {
        let c_id = camera_id(id)?;
        let facing = self.characteristic_u8(&c_id, ACAMERA_LENS_FACING)?;
        let level = self.characteristic_u8(&c_id, ACAMERA_INFO_SUPPORTED_HARDWARE_LEVEL)?;
        Ok(CameraInfo::new(id, lens_facing(facing), hardware_level(level)))
    }

    fn create_frame_sink(
        &self,
        config: &CaptureConfiguration,
        on_frame: FrameAvailableCallback,
    ) -> Result<AndroidFrameSink, CaptureError> {
        AndroidFrameSink::new(config, on_frame)
    }

    fn open_device(
        &self,
        id: &str,
        events: DeviceEventSender<AndroidCameraDevice>,
    ) -> Result<(), CaptureError> {
        let c_id = camera_id(id)?;
        let mut context = Box::new(DeviceContext {
            events: Arc::clone(&events),
        });
        let mut callbacks = Box::new(ffi::ACameraDevice_StateCallbacks {
            context: &mut *context as *mut DeviceContext as *mut c_void,
            onDisconnected: Some(on_device_disconnected),
            onError: Some(on_device_error),
        });

        let mut device = ptr::null_mut();
        unsafe {
            check_camera(
                ffi::ACameraManager_openCamera(
                    self.manager.ptr,
                    c_id.as_ptr(),
                    &mut *callbacks,
                    &mut device,
                ),
                "ACameraManager_openCamera",
            )?;
        }

        events(DeviceEvent::Opened(AndroidCameraDevice {
            id: id.to_string(),
            device,
            _callbacks: callbacks,
            _context: context,
            _manager: Arc::clone(&self.manager),
        }));
        Ok(())
    }
}

struct DeviceContext {
    events: DeviceEventSender<AndroidCameraDevice>,
}

unsafe extern "C" fn on_device_disconnected(context: *mut c_void, _device: *mut ffi::ACameraDevice) {
    if context.is_null() {
        return;
    }
    let context = &*(context as *const DeviceContext);
    (context.events)(DeviceEvent::Disconnected);
}

unsafe extern "C" fn on_device_error(
    context: *mut c_void,
    _device: *mut ffi::ACameraDevice,
    error: c_int,
) {
    if context.is_null() {
        return;
    }
    let context = &*(context as *const DeviceContext);
    (context.events)(DeviceEvent::Error(error));
}

/// An open `ACameraDevice`.
pub struct AndroidCameraDevice {
    id: String,
    device: *mut ffi::ACameraDevice,
    // Referenced by the NDK until the device is closed.
    _callbacks: Box<ffi::ACameraDevice_StateCallbacks>,
    _context: Box<DeviceContext>,
    _manager: Arc<CameraManager>,
}

// SAFETY: the device pointer is only used through `&mut self`; the NDK
// camera API may be called from any thread.
unsafe impl Send for AndroidCameraDevice {}

impl CameraDevice for AndroidCameraDevice {
    type Sink = AndroidFrameSink;
    type Session = AndroidCaptureSession;

    fn id(&self) -> &str {
        &self.id
    }

    fn create_capture_session(
        &mut self,
        sink: &AndroidFrameSink,
        request: CaptureRequest,
        events: SessionEventSender<AndroidCaptureSession>,
    ) -> Result<(), CaptureError> {
        if self.device.is_null() {
            return Err(CaptureError::DeviceAccess("camera already closed".into()));
        }
        let window = sink.window();
        if window.is_null() {
            return Err(CaptureError::DeviceAccess("image reader unavailable".into()));
        }

        let mut parts = SessionParts::empty();
        unsafe {
            check_camera(
                ffi::ACaptureSessionOutputContainer_create(&mut parts.container),
                "ACaptureSessionOutputContainer_create",
            )?;
            check_camera(
                ffi::ACaptureSessionOutput_create(window, &mut parts.output),
                "ACaptureSessionOutput_create",
            )?;
            check_camera(
                ffi::ACaptureSessionOutputContainer_add(parts.container, parts.output),
                "ACaptureSessionOutputContainer_add",
            )?;
            check_camera(
                ffi::ACameraOutputTarget_create(window, &mut parts.target),
                "ACameraOutputTarget_create",
            )?;

            let template = match request.template {
                RequestTemplate::Preview => ffi::ACameraDevice_request_template::TEMPLATE_PREVIEW,
                RequestTemplate::Record => ffi::ACameraDevice_request_template::TEMPLATE_RECORD,
            };
            check_camera(
                ffi::ACameraDevice_createCaptureRequest(self.device, template, &mut parts.request),
                "ACameraDevice_createCaptureRequest",
            )?;
            check_camera(
                ffi::ACaptureRequest_addTarget(parts.request, parts.target),
                "ACaptureRequest_addTarget",
            )?;

            let mode = control_mode_value(request.control_mode);
            check_camera(
                ffi::ACaptureRequest_setEntry_u8(parts.request, ACAMERA_CONTROL_MODE, 1, &mode),
                "ACaptureRequest_setEntry_u8",
            )?;

            let status = ffi::ACameraDevice_createCaptureSession(
                self.device,
                parts.container,
                &*parts.callbacks,
                &mut parts.session,
            );
            if let Err(e) = check_camera(status, "ACameraDevice_createCaptureSession") {
                events(SessionEvent::ConfigureFailed(e.to_string()));
                return Ok(());
            }
        }

        events(SessionEvent::Configured(AndroidCaptureSession { parts }));
        Ok(())
    }

    fn close(&mut self) {
        if self.device.is_null() {
            return;
        }
        let status = unsafe { ffi::ACameraDevice_close(self.device) };
        if let Err(e) = check_camera(status, "ACameraDevice_close") {
            log::warn!("Failed to close camera {}: {}", self.id, e);
        }
        self.device = ptr::null_mut();
    }
}

impl Drop for AndroidCameraDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Everything a capture session owns, freed in reverse creation order.
struct SessionParts {
    container: *mut ffi::ACaptureSessionOutputContainer,
    output: *mut ffi::ACaptureSessionOutput,
    target: *mut ffi::ACameraOutputTarget,
    request: *mut ffi::ACaptureRequest,
    session: *mut ffi::ACameraCaptureSession,
    callbacks: Box<ffi::ACameraCaptureSession_stateCallbacks>,
}

impl SessionParts {
    fn empty() -> Self {
        Self {
            container: ptr::null_mut(),
            output: ptr::null_mut(),
            target: ptr::null_mut(),
            request: ptr::null_mut(),
            session: ptr::null_mut(),
            callbacks: Box::new(ffi::ACameraCaptureSession_stateCallbacks {
                context: ptr::null_mut(),
                onClosed: Some(on_session_closed),
                onReady: None,
                onActive: Some(on_session_active),
            }),
        }
    }

    fn close_session(&mut self) {
        if !self.session.is_null() {
            unsafe { ffi::ACameraCaptureSession_close(self.session) };
            self.session = ptr::null_mut();
        }
    }
}

impl Drop for SessionParts {
    fn drop(&mut self) {
        self.close_session();
        unsafe {
            if !self.request.is_null() {
                ffi::ACaptureRequest_free(self.request);
            }
            if !self.target.is_null() {
                ffi::ACameraOutputTarget_free(self.target);
            }
            if !self.output.is_null() {
                if !self.container.is_null() {
                    let _ = ffi::ACaptureSessionOutputContainer_remove(self.container, self.output);
                }
                ffi::ACaptureSessionOutput_free(self.output);
            }
            if !self.container.is_null() {
                ffi::ACaptureSessionOutputContainer_free(self.container);
            }
        }
    }
}

unsafe extern "C" fn on_session_closed(_context: *mut c_void, _session: *mut ffi::ACameraCaptureSession) {
    log::debug!("Capture session closed");
}

unsafe extern "C" fn on_session_active(_context: *mut c_void, _session: *mut ffi::ACameraCaptureSession) {
    log::debug!("Capture session active");
}

/// A configured `ACameraCaptureSession` with its repeating request.
pub struct AndroidCaptureSession {
    parts: SessionParts,
}

// SAFETY: as for `AndroidCameraDevice`.
unsafe impl Send for AndroidCaptureSession {}

impl CaptureSession for AndroidCaptureSession {
    fn set_repeating_request(&mut self) -> Result<(), CaptureError> {
        if self.parts.session.is_null() {
            return Err(CaptureError::RepeatingRequestFailed("session closed".into()));
        }
        let mut requests = [self.parts.request];
        let mut sequence_id = 0;
        let status = unsafe {
            ffi::ACameraCaptureSession_setRepeatingRequest(
                self.parts.session,
                ptr::null_mut(),
                1,
                requests.as_mut_ptr(),
                &mut sequence_id,
            )
        };
        check_camera(status, "ACameraCaptureSession_setRepeatingRequest")
            .map_err(|e| CaptureError::RepeatingRequestFailed(e.to_string()))?;
        log::debug!("Repeating request submitted, sequence {}", sequence_id);
        Ok(())
    }

    fn stop_repeating(&mut self) -> Result<(), CaptureError> {
        if self.parts.session.is_null() {
            return Ok(());
        }
        let status = unsafe { ffi::ACameraCaptureSession_stopRepeating(self.parts.session) };
        check_camera(status, "ACameraCaptureSession_stopRepeating")?;
        Ok(())
    }

    fn close(&mut self) {
        self.parts.close_session();
    }
}
