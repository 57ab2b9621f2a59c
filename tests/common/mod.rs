// SPDX-License-Identifier: MPL-2.0

//! Shared fixtures: a scriptable camera backend and app builders

#![allow(dead_code)]

use async_trait::async_trait;
use camera_booth::app::{CameraApp, Runtime};
use camera_booth::backends::camera::{
    CameraBackend, CameraBackendType, CaptureDevice, MediaStream, RecorderControl, RecorderEvent,
    RecorderEventSender, RecorderHandle, StreamRequest, VideoFrame,
};
use camera_booth::config::{Config, ConfigHandler};
use camera_booth::constants::MJPEG_MIME_TYPE;
use camera_booth::errors::{BackendResult, CameraError, RecordingError};
use camera_booth::storage::MemoryStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

pub const QUIET: Duration = Duration::from_millis(50);

#[derive(Default)]
struct FakeState {
    devices: Mutex<Option<BackendResult<Vec<CaptureDevice>>>>,
    live: AtomicUsize,
    max_live: AtomicUsize,
    opened: AtomicUsize,
    stops_requested: AtomicUsize,
    /// Acquisitions wait for a permit while set
    gate: Mutex<Option<Arc<Semaphore>>>,
    fail_next: Mutex<Option<CameraError>>,
    frame_ready: Mutex<bool>,
    recorder: Mutex<Option<RecorderEventSender>>,
    /// Chunk flushed between the stop request and `Stopped`
    tail_chunk: Mutex<Option<Vec<u8>>>,
    last_audio: Mutex<Option<bool>>,
}

/// Camera backend whose behaviour tests control
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.set_devices(Ok(vec![
            CaptureDevice::video_input("cam1", "Front"),
            CaptureDevice::video_input("cam2", "Back"),
        ]));
        *backend.state.frame_ready.lock().unwrap() = true;
        backend
    }

    pub fn set_devices(&self, devices: BackendResult<Vec<CaptureDevice>>) {
        *self.state.devices.lock().unwrap() = Some(devices);
    }

    pub fn set_frame_ready(&self, ready: bool) {
        *self.state.frame_ready.lock().unwrap() = ready;
    }

    pub fn fail_next_acquisition(&self, err: CameraError) {
        *self.state.fail_next.lock().unwrap() = Some(err);
    }

    pub fn set_tail_chunk(&self, chunk: Option<Vec<u8>>) {
        *self.state.tail_chunk.lock().unwrap() = chunk;
    }

    /// Make acquisitions wait until [`release_acquisitions`](Self::release_acquisitions)
    pub fn hold_acquisitions(&self) {
        *self.state.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_acquisitions(&self, count: usize) {
        if let Some(gate) = self.state.gate.lock().unwrap().as_ref() {
            gate.add_permits(count);
        }
    }

    /// Deliver a chunk from the running recorder
    pub fn emit_chunk(&self, chunk: &[u8]) {
        let recorder = self.state.recorder.lock().unwrap();
        recorder
            .as_ref()
            .expect("no recorder running")
            .unbounded_send(RecorderEvent::DataAvailable(chunk.to_vec()))
            .unwrap();
    }

    /// Drop the recorder channel without a `Stopped` event
    pub fn drop_recorder(&self) {
        self.state.recorder.lock().unwrap().take();
    }

    pub fn recorder_running(&self) -> bool {
        self.state.recorder.lock().unwrap().is_some()
    }

    pub fn live(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.state.max_live.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn stops_requested(&self) -> usize {
        self.state.stops_requested.load(Ordering::SeqCst)
    }

    pub fn last_audio(&self) -> Option<bool> {
        *self.state.last_audio.lock().unwrap()
    }
}

#[async_trait]
impl CameraBackend for FakeBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::TestPattern
    }

    async fn enumerate_devices(&self) -> BackendResult<Vec<CaptureDevice>> {
        self.state
            .devices
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn acquire_stream(&self, request: StreamRequest) -> BackendResult<Box<dyn MediaStream>> {
        let gate = self.state.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        if let Some(err) = self.state.fail_next.lock().unwrap().take() {
            return Err(err);
        }

        let device_id = request.device_id.unwrap_or_else(|| "cam1".to_string());
        *self.state.last_audio.lock().unwrap() = Some(request.audio);

        let live = self.state.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_live.fetch_max(live, Ordering::SeqCst);
        self.state.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(FakeStream {
            device_id,
            audio: request.audio,
            live: true,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeStream {
    device_id: String,
    audio: bool,
    live: bool,
    state: Arc<FakeState>,
}

impl MediaStream for FakeStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn has_audio(&self) -> bool {
        self.audio
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn frame_ready(&self) -> bool {
        self.live && *self.state.frame_ready.lock().unwrap()
    }

    fn snapshot(&self) -> Option<VideoFrame> {
        if !self.frame_ready() {
            return None;
        }
        Some(VideoFrame::new(4, 2, vec![200u8; 4 * 2 * 4]))
    }

    fn start_recorder(&mut self) -> Result<RecorderHandle, RecordingError> {
        let (sender, events) = futures::channel::mpsc::unbounded();
        *self.state.recorder.lock().unwrap() = Some(sender);
        Ok(RecorderHandle {
            control: Box::new(FakeRecorderControl {
                state: Arc::clone(&self.state),
            }),
            events,
            mime_type: MJPEG_MIME_TYPE.to_string(),
        })
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.state.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.stop();
    }
}

struct FakeRecorderControl {
    state: Arc<FakeState>,
}

impl RecorderControl for FakeRecorderControl {
    fn request_stop(&mut self) {
        self.state.stops_requested.fetch_add(1, Ordering::SeqCst);
        let Some(sender) = self.state.recorder.lock().unwrap().take() else {
            return;
        };
        if let Some(tail) = self.state.tail_chunk.lock().unwrap().clone() {
            let _ = sender.unbounded_send(RecorderEvent::DataAvailable(tail));
        }
        let _ = sender.unbounded_send(RecorderEvent::Stopped);
    }
}

/// App on `backend` with an in-memory gallery; returns the store for inspection
pub fn runtime_with(backend: &FakeBackend, config: Config) -> (Runtime, MemoryStore) {
    runtime_with_store(backend, config, MemoryStore::new(), None)
}

pub fn runtime_with_store(
    backend: &FakeBackend,
    config: Config,
    store: MemoryStore,
    handler: Option<ConfigHandler>,
) -> (Runtime, MemoryStore) {
    let (app, init) = CameraApp::init(
        config,
        handler,
        Arc::new(backend.clone()),
        Box::new(store.clone()),
    );
    (Runtime::new(app, init), store)
}

/// Started app with an active camera session
pub async fn active_runtime(backend: &FakeBackend, config: Config) -> (Runtime, MemoryStore) {
    let (mut runtime, store) = runtime_with(backend, config);
    runtime.settle(QUIET).await;
    runtime.dispatch(camera_booth::Message::StartCamera);
    runtime.settle(QUIET).await;
    assert!(runtime.app().session().is_active(), "camera should be active");
    (runtime, store)
}

pub fn video_config() -> Config {
    Config {
        default_mode: camera_booth::CaptureMode::Video,
        ..Config::default()
    }
}
