// SPDX-License-Identifier: MPL-2.0

//! Camera application state container
//!
//! # Architecture
//!
//! - `state`: Capture mode, recording sub-state, messages and the rendered view
//! - `update`: Message dispatch
//! - `handlers`: Transition handlers grouped by domain (camera, capture, gallery)
//! - `task`: Deferred work whose results come back as messages
//! - `runtime`: Headless loop that drives tasks and feeds messages back
//!
//! # Main Types
//!
//! - [`CameraApp`]: Owns the device session, recording and gallery state
//! - [`Message`]: All user actions and async completions
//! - [`CaptureMode`]: Photo or Video capture modes

mod handlers;
mod runtime;
pub mod state;
mod task;
mod update;

pub use runtime::Runtime;
pub use state::{AcquiredStream, CaptureMode, Message, RecordingState, RecordingToken, ViewState};
pub use task::Task;

use crate::backends::camera::{CameraBackend, DeviceSessionManager};
use crate::config::{Config, ConfigHandler};
use crate::gallery::GalleryStore;
use crate::pipelines::photo::PhotoPipeline;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Main application state
pub struct CameraApp {
    /// Settings, saved whenever a remembered preference changes
    pub(crate) config: Config,
    pub(crate) config_handler: Option<ConfigHandler>,
    pub(crate) session: DeviceSessionManager,
    /// The user wants the camera on; reset when acquisition fails
    pub(crate) camera_active: bool,
    pub(crate) mode: CaptureMode,
    /// Mode requested while a recording was still being finalized
    pub(crate) pending_mode: Option<CaptureMode>,
    pub(crate) recording: RecordingState,
    /// Audio choice for this run only, never written to the config
    pub(crate) audio_override: Option<bool>,
    pub(crate) gallery: GalleryStore,
    pub(crate) photo_pipeline: PhotoPipeline,
    /// Photos handed to the encoder and not yet stored
    pub(crate) photos_in_flight: usize,
    pub(crate) next_recording_token: u64,
}

impl CameraApp {
    /// Build the application and the startup task (device enumeration)
    pub fn init(
        config: Config,
        config_handler: Option<ConfigHandler>,
        backend: Arc<dyn CameraBackend>,
        store: Box<dyn KeyValueStore>,
    ) -> (Self, Task<Message>) {
        info!(
            backend = %backend.backend_type(),
            mode = %config.default_mode,
            "Initializing camera app"
        );

        let mut session = DeviceSessionManager::new(backend, config.last_device_id.clone());
        let mode = config.default_mode;
        session.set_include_audio(mode == CaptureMode::Video && config.record_audio);

        let app = Self {
            photo_pipeline: PhotoPipeline::new(config.photo_format, config.photo_quality),
            config,
            config_handler,
            session,
            camera_active: false,
            mode,
            pending_mode: None,
            recording: RecordingState::Idle,
            audio_override: None,
            gallery: GalleryStore::load(store),
            photos_in_flight: 0,
            next_recording_token: 0,
        };

        let task = app.enumerate_task();
        (app, task)
    }

    /// Snapshot of everything a renderer needs
    pub fn view(&self) -> ViewState {
        ViewState {
            camera_active: self.camera_active,
            mode: self.mode,
            is_recording: self.recording.is_recording(),
            devices: self.session.devices().to_vec(),
            selected_device_id: self.session.selected_device_id().map(str::to_string),
            gallery: self.gallery.records().to_vec(),
            selection: self.gallery.selected().cloned(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &DeviceSessionManager {
        &self.session
    }

    pub fn gallery(&self) -> &GalleryStore {
        &self.gallery
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn pending_mode(&self) -> Option<CaptureMode> {
        self.pending_mode
    }

    pub fn recording(&self) -> &RecordingState {
        &self.recording
    }

    pub fn is_camera_active(&self) -> bool {
        self.camera_active
    }

    /// Whether a photo is still being encoded
    pub fn is_capturing(&self) -> bool {
        self.photos_in_flight > 0
    }

    /// Audio is only requested in video mode
    pub(crate) fn wants_audio(&self) -> bool {
        self.mode == CaptureMode::Video && self.audio_override.unwrap_or(self.config.record_audio)
    }

    pub(crate) fn save_config(&self) {
        if let Some(handler) = &self.config_handler
            && let Err(e) = handler.save(&self.config)
        {
            warn!(error = %e, "Failed to save config");
        }
    }
}

impl std::fmt::Debug for CameraApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraApp")
            .field("camera_active", &self.camera_active)
            .field("mode", &self.mode)
            .field("pending_mode", &self.pending_mode)
            .field("recording", &self.recording.is_recording())
            .field("session", &self.session)
            .field("gallery", &self.gallery)
            .finish()
    }
}
