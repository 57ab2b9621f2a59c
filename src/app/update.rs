// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The main `update()` function acts as a dispatcher; the transitions live in
//! the `handlers` submodules organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::camera`: Camera on/off, device enumeration and selection
//! - `handlers::capture`: Mode switching, photo capture, video recording
//! - `handlers::gallery`: Gallery selection and deletion

use super::CameraApp;
use super::state::{AcquiredStream, Message};
use super::task::Task;

impl CameraApp {
    /// Main message handler - routes messages to appropriate handler methods.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            // ===== Camera Control =====
            Message::StartCamera => self.handle_start_camera(),
            Message::StopCamera => self.handle_stop_camera(),
            Message::ToggleCamera => {
                if self.camera_active {
                    self.handle_stop_camera()
                } else {
                    self.handle_start_camera()
                }
            }
            Message::RefreshDevices => self.enumerate_task(),
            Message::DevicesEnumerated(result) => self.handle_devices_enumerated(result),
            Message::SelectDevice(device_id) => self.handle_select_device(device_id),
            Message::SessionOpened(token, AcquiredStream(result)) => {
                self.handle_session_opened(token, result)
            }

            // ===== Capture =====
            Message::SetMode(mode) => self.handle_set_mode(mode),
            Message::ToggleCapture => self.handle_toggle_capture(),
            Message::CapturePhoto => self.handle_capture_photo(),
            Message::PhotoEncoded(result) => self.handle_photo_encoded(result),
            Message::StartRecording => self.handle_start_recording(),
            Message::StopRecording => self.handle_stop_recording(),
            Message::Recorder(token, event) => self.handle_recorder_event(token, event),
            Message::RecorderClosed(token) => self.handle_recorder_closed(token),
            Message::SetRecordAudio(enabled) => self.handle_set_record_audio(enabled),
            Message::OverrideRecordAudio(enabled) => self.handle_override_record_audio(enabled),

            // ===== Gallery =====
            Message::SelectMedia(id) => self.handle_select_media(id),
            Message::DeleteMedia(id) => self.handle_delete_media(id),
        }
    }
}
