// SPDX-License-Identifier: GPL-3.0-only

//! Device session manager
//!
//! Owns the device list, the remembered device preference and the single live
//! capture session. The lifecycle is
//!
//! ```text
//! Inactive ──open──▶ Opening ──complete_open(Ok)──▶ Active
//!     ▲                 │                              │
//!     └──complete_open(Err) / close ◀──────────────────┘
//! ```
//!
//! Every `open` is tagged with a [`SessionToken`]. A completion whose token no
//! longer matches the outstanding request (because `close` or a newer `open`
//! happened in between) is discarded and its stream stopped on the spot, so at
//! most one stream from this manager is ever live.

use super::types::*;
use super::{CameraBackend, MediaStream};
use crate::errors::{BackendResult, CameraError};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

/// Tag identifying one acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

/// Externally visible session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Inactive,
    Opening,
    Active,
}

enum SessionState {
    Inactive,
    Opening {
        token: SessionToken,
        cancel: CancelFlag,
    },
    Active {
        token: SessionToken,
        stream: Box<dyn MediaStream>,
    },
}

/// An acquisition that has been started but not yet resolved
///
/// The caller awaits `acquisition` and hands the result back through
/// [`DeviceSessionManager::complete_open`] together with `token`.
pub struct OpenRequest {
    pub token: SessionToken,
    pub acquisition: BoxFuture<'static, BackendResult<Box<dyn MediaStream>>>,
}

impl std::fmt::Debug for OpenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRequest")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Result of applying an acquisition completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The session is now live
    Active,
    /// The acquisition failed; the session is inactive
    Failed(CameraError),
    /// The completion belonged to a superseded request and was released
    Superseded,
}

/// Camera session lifecycle manager
pub struct DeviceSessionManager {
    backend: Arc<dyn CameraBackend>,
    devices: Vec<CaptureDevice>,
    selected_device_id: Option<String>,
    /// Audio flag used for the next open
    include_audio: bool,
    state: SessionState,
    next_token: u64,
}

impl DeviceSessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    /// * `backend` - Backend used for enumeration and acquisition
    /// * `preferred_device_id` - Device remembered from a previous run, if any
    pub fn new(backend: Arc<dyn CameraBackend>, preferred_device_id: Option<String>) -> Self {
        info!(backend = %backend.backend_type(), "Creating device session manager");

        Self {
            backend,
            devices: Vec::new(),
            selected_device_id: preferred_device_id,
            include_audio: false,
            state: SessionState::Inactive,
            next_token: 0,
        }
    }

    pub fn backend_type(&self) -> CameraBackendType {
        self.backend.backend_type()
    }

    pub fn devices(&self) -> &[CaptureDevice] {
        &self.devices
    }

    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected_device_id.as_deref()
    }

    pub fn selected_device(&self) -> Option<&CaptureDevice> {
        let id = self.selected_device_id.as_deref()?;
        self.devices.iter().find(|d| d.device_id == id)
    }

    pub fn include_audio(&self) -> bool {
        self.include_audio
    }

    /// Set the audio flag for the *next* open; the live session is untouched
    pub fn set_include_audio(&mut self, include_audio: bool) {
        self.include_audio = include_audio;
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Inactive => SessionPhase::Inactive,
            SessionState::Opening { .. } => SessionPhase::Opening,
            SessionState::Active { .. } => SessionPhase::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// Token of the outstanding or live session
    pub fn current_token(&self) -> Option<SessionToken> {
        match &self.state {
            SessionState::Inactive => None,
            SessionState::Opening { token, .. } | SessionState::Active { token, .. } => {
                Some(*token)
            }
        }
    }

    /// The live stream, if the session is active
    pub fn stream(&self) -> Option<&dyn MediaStream> {
        match &self.state {
            SessionState::Active { stream, .. } => Some(stream.as_ref()),
            _ => None,
        }
    }

    pub fn stream_mut(&mut self) -> Option<&mut (dyn MediaStream + 'static)> {
        match &mut self.state {
            SessionState::Active { stream, .. } => Some(stream.as_mut()),
            _ => None,
        }
    }

    // ===== Enumeration =====

    /// Start a device enumeration
    ///
    /// The result is applied with [`apply_enumeration`](Self::apply_enumeration).
    pub fn enumerate_devices(&self) -> BoxFuture<'static, BackendResult<Vec<CaptureDevice>>> {
        let backend = Arc::clone(&self.backend);
        async move { backend.enumerate_devices().await }.boxed()
    }

    /// Apply an enumeration result
    ///
    /// Failures are logged and leave the device list unchanged. When nothing is
    /// selected, or the remembered device is no longer present, the first
    /// device becomes the selection. Returns whether the list was replaced.
    pub fn apply_enumeration(&mut self, result: BackendResult<Vec<CaptureDevice>>) -> bool {
        let devices = match result {
            Ok(devices) => devices,
            Err(err) => {
                warn!(error = %err, "Device enumeration failed, keeping previous device list");
                return false;
            }
        };

        info!(count = devices.len(), "Devices enumerated");
        self.devices = devices;

        let selection_present = self
            .selected_device_id
            .as_deref()
            .is_some_and(|id| self.devices.iter().any(|d| d.device_id == id));

        if !selection_present && let Some(first) = self.devices.first() {
            if let Some(stale) = &self.selected_device_id {
                debug!(stale = %stale, "Remembered device not present");
            }
            info!(device = %first.display_name(), "Selecting default device");
            self.selected_device_id = Some(first.device_id.clone());
        }

        true
    }

    // ===== Lifecycle =====

    /// Begin acquiring a session bound to `device_id`
    ///
    /// Any open or opening session is released first. `None` lets the backend
    /// choose its default device.
    pub fn open(&mut self, device_id: Option<String>, include_audio: bool) -> OpenRequest {
        self.close();

        self.next_token += 1;
        let token = SessionToken(self.next_token);
        self.include_audio = include_audio;
        if let Some(id) = &device_id {
            self.selected_device_id = Some(id.clone());
        }

        info!(
            ?token,
            device = device_id.as_deref().unwrap_or("<default>"),
            audio = include_audio,
            "Opening camera session"
        );

        let request = StreamRequest::new(device_id, include_audio);
        self.state = SessionState::Opening {
            token,
            cancel: Arc::clone(&request.cancel),
        };

        let backend = Arc::clone(&self.backend);
        OpenRequest {
            token,
            acquisition: async move { backend.acquire_stream(request).await }.boxed(),
        }
    }

    /// Apply the result of an acquisition started by [`open`](Self::open)
    pub fn complete_open(
        &mut self,
        token: SessionToken,
        result: BackendResult<Box<dyn MediaStream>>,
    ) -> OpenOutcome {
        let outstanding = matches!(
            &self.state,
            SessionState::Opening { token: pending, .. } if *pending == token
        );

        if !outstanding {
            match result {
                Ok(mut stream) => {
                    info!(?token, device = %stream.device_id(), "Releasing stream from superseded request");
                    stream.stop();
                }
                Err(err) => debug!(?token, error = %err, "Superseded request failed"),
            }
            return OpenOutcome::Superseded;
        }

        match result {
            Ok(stream) => {
                info!(?token, device = %stream.device_id(), audio = stream.has_audio(), "Camera session active");
                // The backend may have picked its default device
                self.selected_device_id = Some(stream.device_id().to_string());
                self.state = SessionState::Active { token, stream };
                OpenOutcome::Active
            }
            Err(err) => {
                warn!(?token, error = %err, "Failed to open camera session");
                self.state = SessionState::Inactive;
                OpenOutcome::Failed(err)
            }
        }
    }

    /// Release the current session
    ///
    /// Stops the stream's tracks, which also detaches the preview. An in-flight
    /// acquisition is cancelled and its eventual completion will be released.
    /// Safe to call when nothing is open.
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.state, SessionState::Inactive) {
            SessionState::Inactive => {}
            SessionState::Opening { token, cancel } => {
                info!(?token, "Cancelling in-flight camera acquisition");
                cancel.store(true, Ordering::Release);
            }
            SessionState::Active { token, mut stream } => {
                info!(?token, device = %stream.device_id(), "Closing camera session");
                stream.stop();
            }
        }
    }

    /// Switch to another device
    ///
    /// Reopens against the new device when a session is open (or opening);
    /// otherwise only the preference changes.
    pub fn switch_device(&mut self, device_id: String) -> Option<OpenRequest> {
        info!(device = %device_id, "Switching camera");

        if self.phase() == SessionPhase::Inactive {
            self.selected_device_id = Some(device_id);
            return None;
        }

        let include_audio = self.include_audio;
        Some(self.open(Some(device_id), include_audio))
    }
}

impl Drop for DeviceSessionManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DeviceSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSessionManager")
            .field("backend_type", &self.backend.backend_type())
            .field("devices", &self.devices.len())
            .field("selected_device_id", &self.selected_device_id)
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::RecorderHandle;
    use crate::errors::RecordingError;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counters {
        live: AtomicUsize,
        opened: AtomicUsize,
    }

    struct StubBackend {
        counters: Arc<Counters>,
        devices: BackendResult<Vec<CaptureDevice>>,
    }

    struct StubStream {
        device_id: String,
        live: bool,
        counters: Arc<Counters>,
    }

    impl MediaStream for StubStream {
        fn device_id(&self) -> &str {
            &self.device_id
        }
        fn has_audio(&self) -> bool {
            false
        }
        fn is_live(&self) -> bool {
            self.live
        }
        fn frame_ready(&self) -> bool {
            false
        }
        fn snapshot(&self) -> Option<VideoFrame> {
            None
        }
        fn start_recorder(&mut self) -> Result<RecorderHandle, RecordingError> {
            Err(RecordingError::NotSupported("stub".into()))
        }
        fn stop(&mut self) {
            if self.live {
                self.live = false;
                self.counters.live.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    #[async_trait]
    impl CameraBackend for StubBackend {
        fn backend_type(&self) -> CameraBackendType {
            CameraBackendType::TestPattern
        }

        async fn enumerate_devices(&self) -> BackendResult<Vec<CaptureDevice>> {
            self.devices.clone()
        }

        async fn acquire_stream(
            &self,
            request: StreamRequest,
        ) -> BackendResult<Box<dyn MediaStream>> {
            let device_id = request.device_id.unwrap_or_else(|| "cam1".to_string());
            if device_id == "missing" {
                return Err(CameraError::DeviceNotFound(device_id));
            }
            self.counters.live.fetch_add(1, Ordering::SeqCst);
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubStream {
                device_id,
                live: true,
                counters: Arc::clone(&self.counters),
            }))
        }
    }

    fn manager_with(devices: BackendResult<Vec<CaptureDevice>>) -> (DeviceSessionManager, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let backend = StubBackend {
            counters: Arc::clone(&counters),
            devices,
        };
        (DeviceSessionManager::new(Arc::new(backend), None), counters)
    }

    fn two_cameras() -> Vec<CaptureDevice> {
        vec![
            CaptureDevice::video_input("cam1", "Front"),
            CaptureDevice::video_input("cam2", "Back"),
        ]
    }

    #[test]
    fn test_first_enumeration_selects_first_device() {
        let (mut manager, _) = manager_with(Ok(two_cameras()));
        let result = block_on(manager.enumerate_devices());
        assert!(manager.apply_enumeration(result));
        assert_eq!(manager.selected_device_id(), Some("cam1"));
        assert_eq!(manager.devices().len(), 2);
    }

    #[test]
    fn test_enumeration_keeps_existing_selection() {
        let (mut manager, _) = manager_with(Ok(two_cameras()));
        manager.switch_device("cam2".to_string());
        let result = block_on(manager.enumerate_devices());
        manager.apply_enumeration(result);
        assert_eq!(manager.selected_device_id(), Some("cam2"));
    }

    #[test]
    fn test_failed_enumeration_leaves_list_unchanged() {
        let (mut manager, _) = manager_with(Ok(two_cameras()));
        manager.apply_enumeration(Ok(two_cameras()));
        let changed = manager.apply_enumeration(Err(CameraError::EnumerationFailed(
            "denied".to_string(),
        )));
        assert!(!changed);
        assert_eq!(manager.devices().len(), 2);
    }

    #[test]
    fn test_open_then_complete_becomes_active() {
        let (mut manager, counters) = manager_with(Ok(two_cameras()));
        let request = manager.open(Some("cam1".to_string()), false);
        assert_eq!(manager.phase(), SessionPhase::Opening);

        let result = block_on(request.acquisition);
        assert_eq!(manager.complete_open(request.token, result), OpenOutcome::Active);
        assert!(manager.is_active());
        assert_eq!(counters.live.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_before_completion_releases_late_stream() {
        let (mut manager, counters) = manager_with(Ok(two_cameras()));
        let request = manager.open(Some("cam1".to_string()), false);
        manager.close();

        let result = block_on(request.acquisition);
        assert_eq!(
            manager.complete_open(request.token, result),
            OpenOutcome::Superseded
        );
        assert_eq!(manager.phase(), SessionPhase::Inactive);
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_close_cancels_in_flight_request() {
        let (mut manager, _) = manager_with(Ok(two_cameras()));
        let _request = manager.open(Some("cam1".to_string()), false);
        let cancel = match &manager.state {
            SessionState::Opening { cancel, .. } => Arc::clone(cancel),
            _ => panic!("expected opening state"),
        };
        manager.close();
        assert!(cancel.load(Ordering::Acquire));
    }

    #[test]
    fn test_failed_open_returns_to_inactive() {
        let (mut manager, _) = manager_with(Ok(two_cameras()));
        let request = manager.open(Some("missing".to_string()), false);
        let result = block_on(request.acquisition);
        let outcome = manager.complete_open(request.token, result);
        assert!(matches!(outcome, OpenOutcome::Failed(CameraError::DeviceNotFound(_))));
        assert_eq!(manager.phase(), SessionPhase::Inactive);
    }

    #[test]
    fn test_reopen_releases_previous_session() {
        let (mut manager, counters) = manager_with(Ok(two_cameras()));
        let first = manager.open(Some("cam1".to_string()), false);
        let result = block_on(first.acquisition);
        manager.complete_open(first.token, result);

        let second = manager.open(Some("cam2".to_string()), true);
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
        let result = block_on(second.acquisition);
        manager.complete_open(second.token, result);

        assert_eq!(counters.live.load(Ordering::SeqCst), 1);
        assert_eq!(manager.stream().map(|s| s.device_id()), Some("cam2"));
        assert!(manager.include_audio());
    }

    #[test]
    fn test_switch_device_without_session_only_updates_preference() {
        let (mut manager, counters) = manager_with(Ok(two_cameras()));
        assert!(manager.switch_device("cam2".to_string()).is_none());
        assert_eq!(manager.selected_device_id(), Some("cam2"));
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut manager, counters) = manager_with(Ok(two_cameras()));
        manager.close();
        let request = manager.open(None, false);
        let result = block_on(request.acquisition);
        manager.complete_open(request.token, result);
        manager.close();
        manager.close();
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
        assert_eq!(manager.phase(), SessionPhase::Inactive);
    }
}
