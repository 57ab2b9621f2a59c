// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles mode switching, photo capture and the video recording lifecycle.
//! A recording stays in `Finalizing` between the stop request and the
//! recorder's `Stopped` event; the video record is built from the session's
//! own buffer at that point.

use crate::app::CameraApp;
use crate::app::state::{CaptureMode, Message, RecordingState, RecordingToken};
use crate::app::task::Task;
use crate::backends::camera::RecorderEvent;
use crate::errors::PhotoError;
use crate::gallery::MediaRecord;
use crate::pipelines::photo::EncodedImage;
use crate::pipelines::video::RecordingSession;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

impl CameraApp {
    // =========================================================================
    // Mode
    // =========================================================================

    pub(crate) fn handle_set_mode(&mut self, mode: CaptureMode) -> Task<Message> {
        if mode == self.mode && self.pending_mode.is_none() {
            return Task::none();
        }

        if self.recording.is_recording() {
            if mode == CaptureMode::Video {
                // Back to the current mode before finalization finished
                self.pending_mode = None;
                return Task::none();
            }
            // Applied once the video record has been stored
            info!(%mode, "Stopping recording before mode switch");
            self.pending_mode = Some(mode);
            self.request_recording_stop();
            return Task::none();
        }

        self.apply_mode(mode);
        Task::none()
    }

    fn apply_mode(&mut self, mode: CaptureMode) {
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "Capture mode changed");
        }
        self.mode = mode;
        self.pending_mode = None;
        // The live session is kept; only the next open changes
        self.session.set_include_audio(self.wants_audio());
    }

    pub(crate) fn handle_set_record_audio(&mut self, enabled: bool) -> Task<Message> {
        self.config.record_audio = enabled;
        self.audio_override = None;
        self.save_config();
        self.session.set_include_audio(self.wants_audio());
        Task::none()
    }

    pub(crate) fn handle_override_record_audio(&mut self, enabled: bool) -> Task<Message> {
        debug!(enabled, "Audio override for this run");
        self.audio_override = Some(enabled);
        self.session.set_include_audio(self.wants_audio());
        Task::none()
    }

    pub(crate) fn handle_toggle_capture(&mut self) -> Task<Message> {
        match self.mode {
            CaptureMode::Photo => self.handle_capture_photo(),
            CaptureMode::Video => match self.recording {
                RecordingState::Idle => self.handle_start_recording(),
                RecordingState::Recording { .. } => self.handle_stop_recording(),
                RecordingState::Finalizing { .. } => Task::none(),
            },
        }
    }

    // =========================================================================
    // Photo
    // =========================================================================

    pub(crate) fn handle_capture_photo(&mut self) -> Task<Message> {
        let Some(stream) = self.session.stream() else {
            info!("No camera session, photo not taken");
            return Task::none();
        };

        if !stream.frame_ready() {
            info!("Preview has no frame yet, photo not taken");
            return Task::none();
        }

        let Some(frame) = stream.snapshot() else {
            info!("No frame available to capture");
            return Task::none();
        };

        info!(width = frame.width, height = frame.height, "Capturing photo...");
        self.photos_in_flight += 1;
        Task::perform(self.photo_pipeline.capture(frame), Message::PhotoEncoded)
    }

    pub(crate) fn handle_photo_encoded(
        &mut self,
        result: Result<EncodedImage, PhotoError>,
    ) -> Task<Message> {
        self.photos_in_flight = self.photos_in_flight.saturating_sub(1);

        match result {
            Ok(image) => {
                let record = MediaRecord::photo(image.format.mime_type(), &image.data);
                let id = record.id.clone();
                match self.gallery.add(record) {
                    Ok(()) => info!(id = %id, size = image.data.len(), "Photo saved"),
                    Err(e) => error!(error = %e, "Failed to store photo"),
                }
            }
            Err(e) => error!(error = %e, "Failed to capture photo"),
        }
        Task::none()
    }

    // =========================================================================
    // Video
    // =========================================================================

    pub(crate) fn handle_start_recording(&mut self) -> Task<Message> {
        if self.mode != CaptureMode::Video {
            debug!("Not in video mode, ignoring start recording");
            return Task::none();
        }
        if self.recording.is_recording() {
            debug!("Already recording");
            return Task::none();
        }
        let Some(live) = self.session.stream_mut() else {
            info!("No camera session, cannot record");
            return Task::none();
        };

        let handle = match live.start_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "Failed to start recording");
                return Task::none();
            }
        };

        self.next_recording_token += 1;
        let token = RecordingToken(self.next_recording_token);
        let session = RecordingSession::start(handle.control, handle.mime_type);
        self.recording = RecordingState::Recording { token, session };

        // A trailing `None` marks the end of the channel
        let events = handle
            .events
            .map(Some)
            .chain(futures::stream::once(async { None }));
        Task::run(events, move |event| match event {
            Some(event) => Message::Recorder(token, event),
            None => Message::RecorderClosed(token),
        })
    }

    pub(crate) fn handle_stop_recording(&mut self) -> Task<Message> {
        if !matches!(self.recording, RecordingState::Recording { .. }) {
            debug!("Not recording, ignoring stop");
            return Task::none();
        }
        self.request_recording_stop();
        Task::none()
    }

    /// Ask the recorder to stop and move to `Finalizing`
    pub(crate) fn request_recording_stop(&mut self) {
        self.recording = match std::mem::take(&mut self.recording) {
            RecordingState::Recording { token, mut session } => {
                info!(
                    ?token,
                    chunks = session.buffer().chunk_count(),
                    "Stopping recording"
                );
                session.request_stop();
                RecordingState::Finalizing { token, session }
            }
            other => other,
        };
    }

    pub(crate) fn handle_recorder_event(
        &mut self,
        token: RecordingToken,
        event: RecorderEvent,
    ) -> Task<Message> {
        if self.recording.token() != Some(token) {
            debug!(?token, ?event, "Ignoring event from finished recorder");
            return Task::none();
        }

        match event {
            RecorderEvent::DataAvailable(chunk) => {
                if let Some(session) = self.recording.session_mut() {
                    session.push_chunk(chunk);
                }
            }
            RecorderEvent::Stopped => self.finalize_recording(),
        }
        Task::none()
    }

    pub(crate) fn handle_recorder_closed(&mut self, token: RecordingToken) -> Task<Message> {
        if self.recording.token() == Some(token) {
            warn!(?token, "Recorder ended without a stop notification");
            self.finalize_recording();
        }
        Task::none()
    }

    /// Turn the buffered chunks into a video record and go back to idle
    fn finalize_recording(&mut self) {
        let session = match std::mem::take(&mut self.recording) {
            RecordingState::Recording { session, .. }
            | RecordingState::Finalizing { session, .. } => session,
            RecordingState::Idle => return,
        };

        let artifact = session.finish();
        if artifact.data.is_empty() {
            warn!("Recording produced no data, nothing saved");
        } else {
            let record = MediaRecord::video(&artifact.mime_type, &artifact.data);
            let id = record.id.clone();
            match self.gallery.add(record) {
                Ok(()) => info!(
                    id = %id,
                    size = artifact.data.len(),
                    duration_ms = artifact.duration.as_millis() as u64,
                    "Video saved"
                ),
                Err(e) => error!(error = %e, "Failed to store video"),
            }
        }

        if let Some(mode) = self.pending_mode.take() {
            self.apply_mode(mode);
        }
    }
}
