// SPDX-License-Identifier: GPL-3.0-only

//! Application state types
//!
//! Capture mode, recording sub-state, the message enum driving
//! [`CameraApp::update`](super::CameraApp::update) and the rendered view.

use crate::backends::camera::{CaptureDevice, MediaStream, RecorderEvent, SessionToken};
use crate::errors::{BackendResult, PhotoError};
use crate::gallery::MediaRecord;
use crate::pipelines::photo::EncodedImage;
use crate::pipelines::video::RecordingSession;
use serde::{Deserialize, Serialize};

/// Photo or video capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    #[default]
    Photo,
    Video,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::Photo => write!(f, "Photo"),
            CaptureMode::Video => write!(f, "Video"),
        }
    }
}

/// Tag identifying one recording, so events from an earlier recorder are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordingToken(pub(crate) u64);

/// Video recording sub-state
#[derive(Debug, Default)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Recorder running, chunks accumulating
    Recording {
        token: RecordingToken,
        session: RecordingSession,
    },
    /// Stop requested, waiting for the recorder's `Stopped`
    Finalizing {
        token: RecordingToken,
        session: RecordingSession,
    },
}

impl RecordingState {
    /// Check if a recording is in progress (including finalization)
    pub fn is_recording(&self) -> bool {
        !matches!(self, RecordingState::Idle)
    }

    pub fn token(&self) -> Option<RecordingToken> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording { token, .. } | RecordingState::Finalizing { token, .. } => {
                Some(*token)
            }
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut RecordingSession> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording { session, .. }
            | RecordingState::Finalizing { session, .. } => Some(session),
        }
    }

    /// Number of chunks buffered by the current recording
    pub fn buffered_chunks(&self) -> usize {
        match self {
            RecordingState::Idle => 0,
            RecordingState::Recording { session, .. }
            | RecordingState::Finalizing { session, .. } => session.buffer().chunk_count(),
        }
    }
}

/// Result of a stream acquisition, carried back into the update loop
pub struct AcquiredStream(pub BackendResult<Box<dyn MediaStream>>);

impl std::fmt::Debug for AcquiredStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Ok(stream) => write!(f, "Ok({})", stream.device_id()),
            Err(err) => write!(f, "Err({})", err),
        }
    }
}

/// Messages handled by [`CameraApp::update`](super::CameraApp::update)
#[derive(Debug)]
pub enum Message {
    // ===== Camera Control =====
    /// Turn the camera on (open a session on the selected device)
    StartCamera,
    /// Turn the camera off
    StopCamera,
    /// Toggle the camera on or off
    ToggleCamera,
    /// Re-enumerate devices
    RefreshDevices,
    /// Device enumeration finished
    DevicesEnumerated(BackendResult<Vec<CaptureDevice>>),
    /// Select a specific camera by id
    SelectDevice(String),
    /// Stream acquisition finished
    SessionOpened(SessionToken, AcquiredStream),

    // ===== Capture =====
    /// Switch capture mode
    SetMode(CaptureMode),
    /// Photo mode: capture, video mode: start or stop recording
    ToggleCapture,
    CapturePhoto,
    /// Photo encoding finished
    PhotoEncoded(Result<EncodedImage, PhotoError>),
    StartRecording,
    StopRecording,
    /// Event from the recorder started for the given recording
    Recorder(RecordingToken, RecorderEvent),
    /// The recorder's event channel closed
    RecorderClosed(RecordingToken),
    /// Request audio in video mode for subsequent sessions
    SetRecordAudio(bool),
    /// Like `SetRecordAudio`, but the choice is not saved
    OverrideRecordAudio(bool),

    // ===== Gallery =====
    /// Select a gallery item for enlarged preview, or clear the selection
    SelectMedia(Option<String>),
    DeleteMedia(String),
}

/// Rendered state of the component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub camera_active: bool,
    pub mode: CaptureMode,
    pub is_recording: bool,
    pub devices: Vec<CaptureDevice>,
    pub selected_device_id: Option<String>,
    pub gallery: Vec<MediaRecord>,
    pub selection: Option<MediaRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_is_not_recording() {
        let state = RecordingState::default();
        assert!(!state.is_recording());
        assert_eq!(state.token(), None);
        assert_eq!(state.buffered_chunks(), 0);
    }

    #[test]
    fn test_capture_mode_display() {
        assert_eq!(CaptureMode::Video.to_string(), "Video");
        assert_eq!(CaptureMode::default(), CaptureMode::Photo);
    }
}
