//! In-memory camera platform for tests.
//!
//! Records every platform call as a short string and lets tests drive the
//! asynchronous side (device/session events, frames) by hand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::camera_models::{CameraInfo, HardwareLevel, LensFacing};
use crate::models::config::{CaptureConfiguration, ControlMode, RequestTemplate};
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::traits::camera_platform::{
    AcquiredFrame, CameraDevice, CameraPlatform, CaptureRequest, CaptureSession, DeviceEvent,
    DeviceEventSender, FrameAvailableCallback, FrameSink, FrameSource, SessionEvent,
    SessionEventSender,
};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::host_context::HostContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenBehavior {
    /// Deliver `Opened` from inside `open_device`.
    Immediate,
    /// Hold the event sender until the test calls `complete_open`.
    Manual,
    /// Refuse the open request.
    Refuse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionBehavior {
    Configure,
    FailConfigure,
    /// Hold the session sender until the test calls `complete_session`.
    Manual,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeBehavior {
    pub open: OpenBehavior,
    pub session: SessionBehavior,
    pub repeat_fails: bool,
    pub sink_fails: bool,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        Self {
            open: OpenBehavior::Immediate,
            session: SessionBehavior::Configure,
            repeat_fails: false,
            sink_fails: false,
        }
    }
}

struct FakeState {
    cameras: Mutex<Vec<CameraInfo>>,
    unreadable: Vec<String>,
    behavior: FakeBehavior,
    calls: Mutex<Vec<String>>,
    device_events: Mutex<Option<(String, DeviceEventSender<FakeDevice>)>>,
    session_events: Mutex<Option<SessionEventSender<FakeSession>>>,
    frame_callback: Mutex<Option<FrameAvailableCallback>>,
    retained_callback: Mutex<Option<FrameAvailableCallback>>,
    released_images: AtomicUsize,
}

/// Cheaply cloneable handle; clones share one recorded state.
#[derive(Clone)]
pub(crate) struct FakePlatform {
    state: Arc<FakeState>,
}

impl FakePlatform {
    pub fn new(cameras: Vec<CameraInfo>) -> Self {
        Self::with_behavior(cameras, FakeBehavior::default())
    }

    pub fn with_behavior(cameras: Vec<CameraInfo>, behavior: FakeBehavior) -> Self {
        Self::build(cameras, Vec::new(), behavior)
    }

    pub fn with_unreadable(cameras: Vec<CameraInfo>, unreadable: Vec<String>) -> Self {
        Self::build(cameras, unreadable, FakeBehavior::default())
    }

    fn build(cameras: Vec<CameraInfo>, unreadable: Vec<String>, behavior: FakeBehavior) -> Self {
        Self {
            state: Arc::new(FakeState {
                cameras: Mutex::new(cameras),
                unreadable,
                behavior,
                calls: Mutex::new(Vec::new()),
                device_events: Mutex::new(None),
                session_events: Mutex::new(None),
                frame_callback: Mutex::new(None),
                retained_callback: Mutex::new(None),
                released_images: AtomicUsize::new(0),
            }),
        }
    }

    /// The usual pair: back camera "0", front camera "1".
    pub fn back_and_front() -> Self {
        Self::new(vec![back("0"), front("1")])
    }

    /// Replace the enumerated cameras, e.g. to unplug one between starts.
    pub fn set_cameras(&self, cameras: Vec<CameraInfo>) {
        *self.state.cameras.lock() = cameras;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().clone()
    }

    pub fn has_call(&self, call: &str) -> bool {
        self.state.calls.lock().iter().any(|c| c == call)
    }

    fn record(&self, call: impl Into<String>) {
        self.state.calls.lock().push(call.into());
    }

    /// Deliver `Opened` for the pending manual open.
    pub fn complete_open(&self) {
        let pending = self.state.device_events.lock().clone();
        if let Some((id, events)) = pending {
            events(DeviceEvent::Opened(FakeDevice::new(id, self.clone())));
        }
    }

    /// Deliver `Configured` for the pending manual session.
    pub fn complete_session(&self) {
        let pending = self.state.session_events.lock().clone();
        if let Some(events) = pending {
            events(SessionEvent::Configured(FakeSession {
                platform: self.clone(),
                closed: false,
            }));
        }
    }

    /// Deliver a non-`Opened` device event on the most recent open request.
    pub fn send_device_event(&self, event: DeviceEvent<FakeDevice>) {
        let pending = self.state.device_events.lock().clone();
        if let Some((_, events)) = pending {
            events(event);
        }
    }

    /// Push a frame through the live sink, if there is one.
    pub fn deliver_frame(&self, payload: Vec<u8>) {
        self.deliver(FakeSource::planes(vec![payload], self.clone()));
    }

    pub fn deliver_unreadable_frame(&self) {
        self.deliver(FakeSource::unreadable(self.clone()));
    }

    fn deliver(&self, source: FakeSource) {
        let callback = self.state.frame_callback.lock().clone();
        if let Some(callback) = callback {
            callback(&source);
        }
    }

    /// The callback handed to the most recent sink, kept even after the
    /// sink closes, to simulate a frame racing with teardown.
    pub fn retained_frame_callback(&self) -> Option<FrameAvailableCallback> {
        self.state.retained_callback.lock().clone()
    }

    pub fn frame_source(&self, payload: Vec<u8>) -> FakeSource {
        FakeSource::planes(vec![payload], self.clone())
    }

    pub fn released_images(&self) -> usize {
        self.state.released_images.load(Ordering::SeqCst)
    }
}

impl CameraPlatform for FakePlatform {
    type Sink = FakeSink;
    type Device = FakeDevice;

    fn camera_ids(&self) -> Result<Vec<String>, CaptureError> {
        Ok(self.state.cameras.lock().iter().map(|c| c.id.clone()).collect())
    }

    fn camera_info(&self, id: &str) -> Result<CameraInfo, CaptureError> {
        if self.state.unreadable.iter().any(|u| u == id) {
            return Err(CaptureError::DeviceAccess(format!("characteristics unavailable for {id}")));
        }
        self.state
            .cameras
            .lock()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| CaptureError::DeviceAccess(format!("unknown camera {id}")))
    }

    fn create_frame_sink(
        &self,
        config: &CaptureConfiguration,
        on_frame: FrameAvailableCallback,
    ) -> Result<FakeSink, CaptureError> {
        if self.state.behavior.sink_fails {
            return Err(CaptureError::DeviceAccess("image reader unavailable".into()));
        }
        self.record(format!(
            "sink.create {}x{} max={}",
            config.width, config.height, config.max_images
        ));
        *self.state.frame_callback.lock() = Some(Arc::clone(&on_frame));
        *self.state.retained_callback.lock() = Some(on_frame);
        Ok(FakeSink {
            platform: self.clone(),
            closed: false,
        })
    }

    fn open_device(
        &self,
        id: &str,
        events: DeviceEventSender<FakeDevice>,
    ) -> Result<(), CaptureError> {
        if self.state.behavior.open == OpenBehavior::Refuse {
            return Err(CaptureError::DeviceAccess(format!("camera {id} in use")));
        }
        self.record(format!("open {id}"));
        *self.state.device_events.lock() = Some((id.to_string(), Arc::clone(&events)));
        if self.state.behavior.open == OpenBehavior::Immediate {
            events(DeviceEvent::Opened(FakeDevice::new(id.to_string(), self.clone())));
        }
        Ok(())
    }
}

pub(crate) struct FakeSink {
    platform: FakePlatform,
    closed: bool,
}

impl FrameSink for FakeSink {
    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        *self.platform.state.frame_callback.lock() = None;
        self.platform.record("sink.close");
    }
}

impl Drop for FakeSink {
    fn drop(&mut self) {
        self.close();
    }
}

pub(crate) struct FakeDevice {
    id: String,
    platform: FakePlatform,
    closed: bool,
}

impl FakeDevice {
    fn new(id: String, platform: FakePlatform) -> Self {
        Self {
            id,
            platform,
            closed: false,
        }
    }
}

impl CameraDevice for FakeDevice {
    type Sink = FakeSink;
    type Session = FakeSession;

    fn id(&self) -> &str {
        &self.id
    }

    fn create_capture_session(
        &mut self,
        _sink: &FakeSink,
        request: CaptureRequest,
        events: SessionEventSender<FakeSession>,
    ) -> Result<(), CaptureError> {
        let template = match request.template {
            RequestTemplate::Preview => "preview",
            RequestTemplate::Record => "record",
        };
        let mode = match request.control_mode {
            ControlMode::Off => "off",
            ControlMode::Auto => "auto",
        };
        self.platform.record(format!("session.create {template} {mode}"));
        match self.platform.state.behavior.session {
            SessionBehavior::Configure => events(SessionEvent::Configured(FakeSession {
                platform: self.platform.clone(),
                closed: false,
            })),
            SessionBehavior::FailConfigure => {
                events(SessionEvent::ConfigureFailed("unsupported output size".into()))
            }
            SessionBehavior::Manual => *self.platform.state.session_events.lock() = Some(events),
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.platform.record(format!("device.close {}", self.id));
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.close();
    }
}

pub(crate) struct FakeSession {
    platform: FakePlatform,
    closed: bool,
}

impl CaptureSession for FakeSession {
    fn set_repeating_request(&mut self) -> Result<(), CaptureError> {
        self.platform.record("session.repeat");
        if self.platform.state.behavior.repeat_fails {
            return Err(CaptureError::DeviceAccess("camera in error state".into()));
        }
        Ok(())
    }

    fn stop_repeating(&mut self) -> Result<(), CaptureError> {
        self.platform.record("session.stop_repeating");
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.platform.record("session.close");
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.close();
    }
}

pub(crate) struct FakeSource {
    planes: Vec<Vec<u8>>,
    unreadable: bool,
    platform: FakePlatform,
}

impl FakeSource {
    fn planes(planes: Vec<Vec<u8>>, platform: FakePlatform) -> Self {
        Self {
            planes,
            unreadable: false,
            platform,
        }
    }

    fn unreadable(platform: FakePlatform) -> Self {
        Self {
            planes: vec![Vec::new()],
            unreadable: true,
            platform,
        }
    }
}

impl FrameSource for FakeSource {
    fn acquire_latest(&self) -> Result<Option<Box<dyn AcquiredFrame + '_>>, CaptureError> {
        Ok(Some(Box::new(FakeImage {
            source: self,
        })))
    }
}

struct FakeImage<'a> {
    source: &'a FakeSource,
}

impl AcquiredFrame for FakeImage<'_> {
    fn plane_count(&self) -> usize {
        self.source.planes.len()
    }

    fn plane_data(&self, index: usize) -> Result<&[u8], CaptureError> {
        if self.source.unreadable {
            return Err(CaptureError::FrameReadFailed("buffer not accessible".into()));
        }
        self.source
            .planes
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| CaptureError::FrameReadFailed(format!("no plane {index}")))
    }
}

impl Drop for FakeImage<'_> {
    fn drop(&mut self) {
        self.source
            .platform
            .state
            .released_images
            .fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct FakeHost {
    granted: AtomicBool,
    requests: AtomicUsize,
}

impl FakeHost {
    pub fn granted() -> Self {
        Self {
            granted: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn denied() -> Self {
        Self {
            granted: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn grant(&self) {
        self.granted.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl HostContext for FakeHost {
    fn has_camera_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request_camera_permission(&self) -> Result<(), CaptureError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Delegate that records everything it is told.
#[derive(Default)]
pub(crate) struct RecordingDelegate {
    pub states: Mutex<Vec<CaptureState>>,
    pub errors: Mutex<Vec<CaptureError>>,
}

impl CaptureDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        self.states.lock().push(state.clone());
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }
}

pub(crate) fn back(id: &str) -> CameraInfo {
    CameraInfo::new(id, LensFacing::Back, HardwareLevel::Full)
}

pub(crate) fn front(id: &str) -> CameraInfo {
    CameraInfo::new(id, LensFacing::Front, HardwareLevel::Limited)
}

pub(crate) fn external(id: &str) -> CameraInfo {
    CameraInfo::new(id, LensFacing::External, HardwareLevel::External)
}

/// Poll `condition` for up to two seconds.
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
