// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Handles turning the camera on and off, device enumeration and device
//! selection. Acquisition results come back as `SessionOpened`.

use crate::app::CameraApp;
use crate::app::state::{AcquiredStream, Message};
use crate::app::task::Task;
use crate::backends::camera::{
    CaptureDevice, MediaStream, OpenOutcome, OpenRequest, SessionPhase, SessionToken,
};
use crate::errors::BackendResult;
use tracing::{debug, info, warn};

impl CameraApp {
    // =========================================================================
    // Camera Control Handlers
    // =========================================================================

    /// Task enumerating devices through the session manager
    pub(crate) fn enumerate_task(&self) -> Task<Message> {
        Task::perform(self.session.enumerate_devices(), Message::DevicesEnumerated)
    }

    fn acquisition_task(request: OpenRequest) -> Task<Message> {
        let token = request.token;
        Task::perform(request.acquisition, move |result| {
            Message::SessionOpened(token, AcquiredStream(result))
        })
    }

    pub(crate) fn handle_start_camera(&mut self) -> Task<Message> {
        if self.camera_active && self.session.phase() != SessionPhase::Inactive {
            debug!("Camera already on");
            return Task::none();
        }

        info!("Starting camera");
        self.camera_active = true;

        let device_id = self.session.selected_device_id().map(str::to_string);
        let request = self.session.open(device_id, self.wants_audio());
        Self::acquisition_task(request)
    }

    pub(crate) fn handle_stop_camera(&mut self) -> Task<Message> {
        info!("Stopping camera");
        self.camera_active = false;

        // The recorder flushes its tail and reports `Stopped` once the stream ends
        self.request_recording_stop();
        self.session.close();
        Task::none()
    }

    pub(crate) fn handle_session_opened(
        &mut self,
        token: SessionToken,
        result: BackendResult<Box<dyn MediaStream>>,
    ) -> Task<Message> {
        match self.session.complete_open(token, result) {
            OpenOutcome::Active => {
                // Labels may only be readable once access has been granted
                self.enumerate_task()
            }
            OpenOutcome::Failed(err) => {
                warn!(error = %err, "Camera unavailable");
                self.camera_active = false;
                Task::none()
            }
            OpenOutcome::Superseded => Task::none(),
        }
    }

    pub(crate) fn handle_devices_enumerated(
        &mut self,
        result: BackendResult<Vec<CaptureDevice>>,
    ) -> Task<Message> {
        if self.session.apply_enumeration(result) {
            debug!(
                devices = self.session.devices().len(),
                selected = ?self.session.selected_device_id(),
                "Device list updated"
            );
        }
        Task::none()
    }

    pub(crate) fn handle_select_device(&mut self, device_id: String) -> Task<Message> {
        let devices = self.session.devices();
        if !devices.is_empty() && !devices.iter().any(|d| d.device_id == device_id) {
            warn!(device = %device_id, "Ignoring selection of unknown device");
            return Task::none();
        }

        if self.session.selected_device_id() == Some(device_id.as_str())
            && self.session.phase() != SessionPhase::Inactive
        {
            return Task::none();
        }

        info!(device = %device_id, "Selecting camera");
        self.config.last_device_id = Some(device_id.clone());
        self.save_config();

        if self.session.phase() != SessionPhase::Inactive {
            self.request_recording_stop();
        }

        match self.session.switch_device(device_id) {
            Some(request) => Self::acquisition_task(request),
            None => Task::none(),
        }
    }
}
