//! JPEG frame sink backed by `AImageReader`.

use std::ffi::c_void;
use std::ptr;

use ndk_sys as ffi;

use passthrough_capture_core::models::config::{CaptureConfiguration, ImageFormat};
use passthrough_capture_core::models::error::CaptureError;
use passthrough_capture_core::traits::camera_platform::{
    AcquiredFrame, FrameAvailableCallback, FrameSink, FrameSource,
};

use crate::error::{check_media, NdkError};

/// `AIMAGE_FORMAT_JPEG` from `media/NdkImage.h`.
const AIMAGE_FORMAT_JPEG: i32 = 0x100;

/// Frame sink wrapping an `AImageReader` and its listener.
pub struct AndroidFrameSink {
    reader: *mut ffi::AImageReader,
    window: *mut ffi::ANativeWindow,
    // Both must stay at a fixed address while the listener is installed.
    listener: Box<ffi::AImageReader_ImageListener>,
    _callback: Box<FrameAvailableCallback>,
}

// SAFETY: the reader is only mutated through `close`, which takes `&mut self`.
// The listener fires on the reader's own thread and only reads `callback`,
// which is `Send + Sync`.
unsafe impl Send for AndroidFrameSink {}

impl AndroidFrameSink {
    pub(crate) fn new(
        config: &CaptureConfiguration,
        on_frame: FrameAvailableCallback,
    ) -> Result<Self, CaptureError> {
        let format = match config.image_format {
            ImageFormat::Jpeg => AIMAGE_FORMAT_JPEG,
        };
        let width = i32::try_from(config.width)
            .map_err(|_| CaptureError::InvalidConfiguration("width out of range".into()))?;
        let height = i32::try_from(config.height)
            .map_err(|_| CaptureError::InvalidConfiguration("height out of range".into()))?;
        let max_images = i32::try_from(config.max_images)
            .map_err(|_| CaptureError::InvalidConfiguration("queue depth out of range".into()))?;

        let mut reader = ptr::null_mut();
        unsafe {
            check_media(
                ffi::AImageReader_new(width, height, format, max_images, &mut reader),
                "AImageReader_new",
            )?;
        }

        let mut callback = Box::new(on_frame);
        let mut sink = Self {
            reader,
            window: ptr::null_mut(),
            listener: Box::new(ffi::AImageReader_ImageListener {
                context: &mut *callback as *mut FrameAvailableCallback as *mut c_void,
                onImageAvailable: Some(on_image_available),
            }),
            _callback: callback,
        };

        unsafe {
            check_media(
                ffi::AImageReader_getWindow(sink.reader, &mut sink.window),
                "AImageReader_getWindow",
            )?;
            check_media(
                ffi::AImageReader_setImageListener(sink.reader, &mut *sink.listener),
                "AImageReader_setImageListener",
            )?;
        }

        log::debug!(
            "Image reader ready: {}x{} JPEG, max images {}",
            width,
            height,
            max_images
        );
        Ok(sink)
    }

    /// The reader's output surface, for session outputs and request targets.
    pub(crate) fn window(&self) -> *mut ffi::ANativeWindow {
        self.window
    }
}

impl FrameSink for AndroidFrameSink {
    fn close(&mut self) {
        if self.reader.is_null() {
            return;
        }
        unsafe {
            // Stop callbacks before the reader goes away.
            let _ = ffi::AImageReader_setImageListener(self.reader, ptr::null_mut());
            ffi::AImageReader_delete(self.reader);
        }
        self.reader = ptr::null_mut();
        self.window = ptr::null_mut();
    }
}

impl Drop for AndroidFrameSink {
    fn drop(&mut self) {
        self.close();
    }
}

unsafe extern "C" fn on_image_available(context: *mut c_void, reader: *mut ffi::AImageReader) {
    if context.is_null() || reader.is_null() {
        return;
    }
    let callback = &*(context as *const FrameAvailableCallback);
    let source = ReaderSource { reader };
    callback(&source);
}

struct ReaderSource {
    reader: *mut ffi::AImageReader,
}

impl FrameSource for ReaderSource {
    fn acquire_latest(&self) -> Result<Option<Box<dyn AcquiredFrame + '_>>, CaptureError> {
        let mut image = ptr::null_mut();
        let status = unsafe { ffi::AImageReader_acquireLatestImage(self.reader, &mut image) };
        if status == ffi::media_status_t::AMEDIA_IMGREADER_NO_BUFFER_AVAILABLE {
            return Ok(None);
        }
        check_media(status, "AImageReader_acquireLatestImage")?;
        if image.is_null() {
            return Ok(None);
        }
        Ok(Some(Box::new(AndroidImage { image })))
    }
}

/// An acquired `AImage`, deleted (released to the reader) on drop.
struct AndroidImage {
    image: *mut ffi::AImage,
}

impl AcquiredFrame for AndroidImage {
    fn plane_count(&self) -> usize {
        let mut planes = 0;
        let status = unsafe { ffi::AImage_getNumberOfPlanes(self.image, &mut planes) };
        if check_media(status, "AImage_getNumberOfPlanes").is_err() {
            return 0;
        }
        usize::try_from(planes).unwrap_or(0)
    }

    fn plane_data(&self, index: usize) -> Result<&[u8], CaptureError> {
        let plane = i32::try_from(index)
            .map_err(|_| CaptureError::FrameReadFailed(format!("plane {index} out of range")))?;
        let mut data = ptr::null_mut();
        let mut len = 0;
        unsafe {
            check_media(
                ffi::AImage_getPlaneData(self.image, plane, &mut data, &mut len),
                "AImage_getPlaneData",
            )
            .map_err(|e: NdkError| CaptureError::FrameReadFailed(e.to_string()))?;
        }
        if data.is_null() || len <= 0 {
            return Err(CaptureError::FrameReadFailed(format!("plane {index} is empty")));
        }
        // SAFETY: the plane buffer is valid until the image is deleted, which
        // cannot happen while `&self` is borrowed.
        Ok(unsafe { std::slice::from_raw_parts(data, len as usize) })
    }
}

impl Drop for AndroidImage {
    fn drop(&mut self) {
        unsafe { ffi::AImage_delete(self.image) };
    }
}
