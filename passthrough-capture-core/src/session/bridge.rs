use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::camera_models::CameraInfo;
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::frame::{BridgeDiagnostics, Frame};
use crate::models::state::CaptureState;
use crate::processing::device_selector::{camera_inventory, select_back_camera};
use crate::processing::latest_frame::LatestFrameSlot;
use crate::traits::camera_platform::{
    AcquiredFrame, CameraDevice, CameraPlatform, CaptureRequest, CaptureSession, DeviceEvent,
    DeviceEventSender, FrameAvailableCallback, FrameSink, FrameSource, SessionEvent,
    SessionEventSender,
};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::host_context::HostContext;

type SessionOf<P> = <<P as CameraPlatform>::Device as CameraDevice>::Session;

/// Platform callbacks, tagged with the cycle they were issued for and
/// marshaled onto the bridge's callback thread.
enum BridgeEvent<D, S> {
    Device { generation: u64, event: DeviceEvent<D> },
    Session { generation: u64, event: SessionEvent<S> },
    Shutdown,
}

enum Notice {
    State(CaptureState),
    Error(CaptureError),
}

/// Frame path state, shared with the sink's callback without going
/// through the lifecycle lock.
#[derive(Default)]
struct FrameIntake {
    slot: LatestFrameSlot,
    /// Generation of the live cycle; 0 when nothing is live.
    live_generation: AtomicU64,
    sequence: AtomicU64,
    frames_received: AtomicU64,
    frame_read_failures: AtomicU64,
    stale_frames_discarded: AtomicU64,
    last_frame_bytes: AtomicUsize,
}

impl FrameIntake {
    fn is_live(&self, generation: u64) -> bool {
        generation != 0 && self.live_generation.load(Ordering::SeqCst) == generation
    }

    /// Take the newest image from the sink and publish its primary plane.
    /// The image is released on every path before this returns.
    fn on_frame_available(&self, generation: u64, source: &dyn FrameSource) {
        let image = match source.acquire_latest() {
            Ok(Some(image)) => image,
            Ok(None) => return,
            Err(e) => {
                self.frame_read_failures.fetch_add(1, Ordering::Relaxed);
                log::error!("Failed to acquire image: {}", e);
                return;
            }
        };

        let payload = read_primary_plane(image.as_ref());
        drop(image);

        match payload {
            Ok(data) => {
                let len = data.len();
                let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                let frame = Frame::new(data, sequence);
                if self.slot.publish_if(frame, || self.is_live(generation)) {
                    self.frames_received.fetch_add(1, Ordering::Relaxed);
                    self.last_frame_bytes.store(len, Ordering::Relaxed);
                    log::debug!("Updated latest JPEG, size={}", len);
                } else {
                    self.stale_frames_discarded.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Discarded frame from a finished capture cycle");
                }
            }
            Err(e) => {
                self.frame_read_failures.fetch_add(1, Ordering::Relaxed);
                log::error!("Failed to read JPEG image: {}", e);
            }
        }
    }
}

fn read_primary_plane(image: &dyn AcquiredFrame) -> Result<Arc<[u8]>, CaptureError> {
    if image.plane_count() == 0 {
        return Err(CaptureError::FrameReadFailed("image has no planes".into()));
    }
    let data = image.plane_data(0)?;
    Ok(Arc::from(data))
}

/// Lifecycle state, protected by `parking_lot::Mutex`.
struct BridgeInner<P: CameraPlatform> {
    state: CaptureState,
    generation: u64,
    cycle_id: Option<Uuid>,
    config: Option<CaptureConfiguration>,
    camera: Option<CameraInfo>,
    // Release order is session → device → sink.
    session: Option<SessionOf<P>>,
    device: Option<P::Device>,
    sink: Option<P::Sink>,
    cycles_started: u64,
    notices: Vec<Notice>,
}

impl<P: CameraPlatform> BridgeInner<P> {
    fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            generation: 0,
            cycle_id: None,
            config: None,
            camera: None,
            session: None,
            device: None,
            sink: None,
            cycles_started: 0,
            notices: Vec::new(),
        }
    }

    fn holds_resources(&self) -> bool {
        self.session.is_some() || self.device.is_some() || self.sink.is_some()
    }

    fn set_state(&mut self, new_state: CaptureState) {
        if self.state == new_state {
            return;
        }
        log::info!("Capture state: {} -> {}", self.state.name(), new_state.name());
        self.state = new_state.clone();
        self.notices.push(Notice::State(new_state));
    }

    /// Record a failure returned synchronously to the caller.
    fn fail(&mut self, error: CaptureError) -> CaptureError {
        self.set_state(CaptureState::Failed(error.clone()));
        error
    }

    /// Record a failure that only surfaces asynchronously.
    fn fail_async(&mut self, error: CaptureError) {
        self.set_state(CaptureState::Failed(error.clone()));
        self.notices.push(Notice::Error(error));
    }

    fn release_device(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        if let Some(mut device) = self.device.take() {
            device.close();
        }
    }

    /// Release everything this cycle acquired, in reverse acquisition order.
    /// Every step is guarded, so partial state from a failed start is fine.
    fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.stop_repeating() {
                log::warn!("Failed to stop repeating request: {}", e);
            }
            session.close();
        }
        if let Some(mut device) = self.device.take() {
            device.close();
        }
        if let Some(mut sink) = self.sink.take() {
            sink.close();
        }
    }
}

struct Shared<P: CameraPlatform> {
    // Declared before `platform` so handles drop before the platform does.
    inner: Mutex<BridgeInner<P>>,
    platform: P,
    intake: Arc<FrameIntake>,
    events: mpsc::Sender<BridgeEvent<P::Device, SessionOf<P>>>,
    delegate: RwLock<Option<Arc<dyn CaptureDelegate>>>,
    // Notices in transition order; one thread delivers at a time.
    outbox: Mutex<VecDeque<Notice>>,
    delivering: AtomicBool,
}

impl<P: CameraPlatform> Shared<P> {
    fn with_inner<R>(&self, f: impl FnOnce(&Self, &mut BridgeInner<P>) -> R) -> R {
        let mut inner = self.inner.lock();
        let result = f(self, &mut inner);
        if !inner.notices.is_empty() {
            self.outbox.lock().extend(inner.notices.drain(..));
        }
        drop(inner);
        self.deliver_notices();
        result
    }

    /// Hand queued notices to the delegate without holding the lifecycle lock.
    fn deliver_notices(&self) {
        loop {
            if self
                .delivering
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // The current deliverer picks up whatever we queued.
                return;
            }

            let delegate = self.delegate.read().clone();
            loop {
                let next = self.outbox.lock().pop_front();
                let Some(notice) = next else {
                    break;
                };
                match (notice, delegate.as_ref()) {
                    (Notice::State(state), Some(d)) => d.on_state_changed(&state),
                    (Notice::Error(error), Some(d)) => d.on_error(&error),
                    (_, None) => {}
                }
            }
            self.delivering.store(false, Ordering::Release);

            if self.outbox.lock().is_empty() {
                return;
            }
        }
    }

    fn device_sender(&self, generation: u64) -> DeviceEventSender<P::Device> {
        let events = self.events.clone();
        Arc::new(move |event| {
            // A closed channel drops the event, closing any handle it carries.
            let _ = events.send(BridgeEvent::Device { generation, event });
        })
    }

    fn session_sender(&self, generation: u64) -> SessionEventSender<SessionOf<P>> {
        let events = self.events.clone();
        Arc::new(move |event| {
            let _ = events.send(BridgeEvent::Session { generation, event });
        })
    }

    fn start(
        &self,
        inner: &mut BridgeInner<P>,
        config: CaptureConfiguration,
    ) -> Result<CameraInfo, CaptureError> {
        if inner.state.is_active() {
            log::warn!("Ignoring start: capture is already {}", inner.state.name());
            return Err(CaptureError::AlreadyRunning);
        }

        self.retire_previous_cycle(inner);

        let cameras = camera_inventory(&self.platform).map_err(|e| inner.fail(e))?;
        let Some(camera) = select_back_camera(&cameras).cloned() else {
            log::error!("No back camera found.");
            return Err(inner.fail(CaptureError::NoBackFacingCamera));
        };
        log::info!("Selected cameraId={}", camera.id);

        inner.generation += 1;
        let generation = inner.generation;
        self.intake.live_generation.store(generation, Ordering::SeqCst);

        let intake = Arc::clone(&self.intake);
        let on_frame: FrameAvailableCallback =
            Arc::new(move |source: &dyn FrameSource| intake.on_frame_available(generation, source));

        let sink = match self.platform.create_frame_sink(&config, on_frame) {
            Ok(sink) => sink,
            Err(e) => {
                self.intake.live_generation.store(0, Ordering::SeqCst);
                log::error!("Failed to create frame sink: {}", e);
                return Err(inner.fail(e));
            }
        };

        let cycle_id = Uuid::new_v4();
        inner.sink = Some(sink);
        inner.camera = Some(camera.clone());
        inner.config = Some(config);
        inner.cycle_id = Some(cycle_id);
        inner.cycles_started += 1;
        inner.set_state(CaptureState::Opening {
            camera_id: camera.id.clone(),
        });

        if let Err(e) = self
            .platform
            .open_device(&camera.id, self.device_sender(generation))
        {
            log::error!("Failed to open camera {}: {}", camera.id, e);
            self.intake.live_generation.store(0, Ordering::SeqCst);
            inner.release();
            return Err(inner.fail(e));
        }

        log::info!("Capture cycle {} opening camera {}", cycle_id, camera.id);
        Ok(camera)
    }

    /// Drop everything a failed cycle left behind, including its frame, so
    /// a new attempt starts from nothing even if it fails early.
    fn retire_previous_cycle(&self, inner: &mut BridgeInner<P>) {
        self.intake.live_generation.store(0, Ordering::SeqCst);
        if inner.holds_resources() {
            log::info!("Releasing resources left by a failed capture cycle");
            inner.release();
        }
        self.intake.slot.clear();
        inner.camera = None;
        inner.config = None;
        inner.cycle_id = None;
    }

    fn stop(&self, inner: &mut BridgeInner<P>) {
        // Invalidate first so in-flight callbacks see the cycle as finished.
        self.intake.live_generation.store(0, Ordering::SeqCst);
        inner.release();
        self.intake.slot.clear();

        if let Some(cycle_id) = inner.cycle_id.take() {
            log::info!("Capture cycle {} stopped", cycle_id);
        }
        inner.camera = None;
        inner.config = None;
        if !inner.state.is_idle() {
            inner.set_state(CaptureState::Stopped);
        }
    }

    fn on_device_event(
        &self,
        inner: &mut BridgeInner<P>,
        generation: u64,
        event: DeviceEvent<P::Device>,
    ) {
        if !self.intake.is_live(generation) {
            if let DeviceEvent::Opened(mut device) = event {
                log::warn!("Closing camera {} opened after its capture cycle ended", device.id());
                device.close();
            } else {
                log::debug!("Ignoring device event from a finished capture cycle");
            }
            return;
        }

        match event {
            DeviceEvent::Opened(mut device) => {
                if !matches!(inner.state, CaptureState::Opening { .. }) {
                    log::warn!("Closing camera {}: not waiting for it", device.id());
                    device.close();
                    return;
                }

                let camera_id = device.id().to_string();
                log::info!("Camera {} opened", camera_id);
                inner.set_state(CaptureState::Configuring {
                    camera_id: camera_id.clone(),
                });

                let result = match (inner.sink.as_ref(), inner.config.as_ref()) {
                    (Some(sink), Some(config)) => device.create_capture_session(
                        sink,
                        CaptureRequest::from(config),
                        self.session_sender(generation),
                    ),
                    _ => Err(CaptureError::DeviceAccess(
                        "camera or image reader unavailable".into(),
                    )),
                };
                inner.device = Some(device);

                if let Err(e) = result {
                    log::error!("Failed to start preview: {}", e);
                    inner.fail_async(e);
                }
            }
            DeviceEvent::Disconnected => {
                log::warn!("Camera disconnected.");
                inner.release_device();
                inner.fail_async(CaptureError::DeviceDisconnected);
            }
            DeviceEvent::Error(code) => {
                log::error!("Camera error: {}", code);
                inner.release_device();
                inner.fail_async(CaptureError::DeviceError(code));
            }
        }
    }

    fn on_session_event(
        &self,
        inner: &mut BridgeInner<P>,
        generation: u64,
        event: SessionEvent<SessionOf<P>>,
    ) {
        let stale = !self.intake.is_live(generation)
            || !matches!(inner.state, CaptureState::Configuring { .. });
        if stale {
            if let SessionEvent::Configured(mut session) = event {
                log::warn!("Closing capture session configured after its capture cycle ended");
                session.close();
            }
            return;
        }

        match event {
            SessionEvent::Configured(mut session) => {
                let result = session.set_repeating_request();
                inner.session = Some(session);
                match result {
                    Ok(()) => {
                        log::info!("Capture session configured.");
                        let camera_id = inner.state.camera_id().unwrap_or_default().to_string();
                        inner.set_state(CaptureState::Capturing { camera_id });
                    }
                    Err(e) => {
                        log::error!("Failed to start repeating request: {}", e);
                        let error = match e {
                            CaptureError::RepeatingRequestFailed(_) => e,
                            other => CaptureError::RepeatingRequestFailed(other.to_string()),
                        };
                        inner.fail_async(error);
                    }
                }
            }
            SessionEvent::ConfigureFailed(reason) => {
                log::error!("Failed to configure capture session: {}", reason);
                inner.fail_async(CaptureError::SessionConfigurationFailed(reason));
            }
        }
    }
}

fn run_callback_thread<P: CameraPlatform>(
    shared: Arc<Shared<P>>,
    events: mpsc::Receiver<BridgeEvent<P::Device, SessionOf<P>>>,
) {
    while let Ok(event) = events.recv() {
        match event {
            BridgeEvent::Device { generation, event } => {
                shared.with_inner(|s, inner| s.on_device_event(inner, generation, event))
            }
            BridgeEvent::Session { generation, event } => {
                shared.with_inner(|s, inner| s.on_session_event(inner, generation, event))
            }
            BridgeEvent::Shutdown => break,
        }
    }
}

/// Passthrough camera bridge.
///
/// Owns the whole capture lifecycle for one camera consumer:
/// ```text
/// start: permission → enumerate → select back camera → frame sink
///        → open device ⇢ capture session ⇢ repeating request
/// frames: sink callback → primary plane copy → LatestFrameSlot
/// stop:  repeating request → session → device → sink → clear frame
/// ```
/// Steps marked `⇢` complete asynchronously on the bridge's callback thread.
/// Construct one bridge per camera consumer; all methods take `&self` and the
/// bridge can be shared across threads.
pub struct PassthroughCaptureBridge<P: CameraPlatform> {
    shared: Arc<Shared<P>>,
    callback_thread: Option<thread::JoinHandle<()>>,
}

impl<P: CameraPlatform> PassthroughCaptureBridge<P> {
    /// Create a bridge over `platform` and spawn its callback thread.
    pub fn new(platform: P) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            inner: Mutex::new(BridgeInner::new()),
            platform,
            intake: Arc::new(FrameIntake::default()),
            events: tx,
            delegate: RwLock::new(None),
            outbox: Mutex::new(VecDeque::new()),
            delivering: AtomicBool::new(false),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("passthrough-callbacks".into())
            .spawn(move || run_callback_thread(thread_shared, rx))?;

        Ok(Self {
            shared,
            callback_thread: Some(handle),
        })
    }

    pub fn set_delegate(&self, delegate: Arc<dyn CaptureDelegate>) {
        *self.shared.delegate.write() = Some(delegate);
    }

    pub fn platform(&self) -> &P {
        &self.shared.platform
    }

    /// Start capturing from the first back-facing camera at `width`×`height`.
    pub fn start(
        &self,
        host: &dyn HostContext,
        width: u32,
        height: u32,
    ) -> Result<CameraInfo, CaptureError> {
        self.start_with_config(host, CaptureConfiguration::new(width, height))
    }

    /// Start capturing with an explicit configuration.
    ///
    /// Returns the selected camera once its open request is issued; opening,
    /// session configuration and the repeating request then complete
    /// asynchronously and are reported through `state()` and the delegate.
    /// Fails with `AlreadyRunning` while a cycle is in flight.
    pub fn start_with_config(
        &self,
        host: &dyn HostContext,
        config: CaptureConfiguration,
    ) -> Result<CameraInfo, CaptureError> {
        config.validate().map_err(CaptureError::InvalidConfiguration)?;
        if self.state().is_active() {
            log::warn!("Ignoring start: capture is already running");
            return Err(CaptureError::AlreadyRunning);
        }

        // Host permission calls may block; keep them off the lifecycle lock.
        if !host.has_camera_permission() {
            host.request_camera_permission()?;
            log::warn!("Camera permission not granted.");
            return Err(CaptureError::PermissionDenied);
        }

        self.shared
            .with_inner(|shared, inner| shared.start(inner, config))
    }

    /// Tear down the current cycle and clear the latest frame.
    ///
    /// Safe to call at any time and any number of times.
    pub fn stop(&self) {
        self.shared.with_inner(|shared, inner| shared.stop(inner));
    }

    /// The most recently captured frame, or `None` before the first frame
    /// and after `stop`.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.shared.intake.slot.load().map(|frame| (*frame).clone())
    }

    /// Payload of the most recent frame.
    pub fn latest_jpeg(&self) -> Option<Arc<[u8]>> {
        self.shared.intake.slot.load().map(|frame| frame.shared_bytes())
    }

    pub fn state(&self) -> CaptureState {
        self.shared.inner.lock().state.clone()
    }

    pub fn diagnostics(&self) -> BridgeDiagnostics {
        let intake = &self.shared.intake;
        let inner = self.shared.inner.lock();
        BridgeDiagnostics {
            cycles_started: inner.cycles_started,
            frames_received: intake.frames_received.load(Ordering::Relaxed),
            frame_read_failures: intake.frame_read_failures.load(Ordering::Relaxed),
            stale_frames_discarded: intake.stale_frames_discarded.load(Ordering::Relaxed),
            last_frame_bytes: intake.last_frame_bytes.load(Ordering::Relaxed),
            camera_id: inner.camera.as_ref().map(|c| c.id.clone()),
            cycle_id: inner.cycle_id,
            state: inner.state.name().to_string(),
        }
    }
}

impl<P: CameraPlatform> Drop for PassthroughCaptureBridge<P> {
    fn drop(&mut self) {
        self.stop();
        let _ = self.shared.events.send(BridgeEvent::Shutdown);
        if let Some(handle) = self.callback_thread.take() {
            // Dropped from a delegate callback: the thread exits on its own.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
