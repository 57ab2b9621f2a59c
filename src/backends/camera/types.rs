// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraBackendType {
    /// Native V4L2 capture (Linux)
    V4l2,
    /// Synthetic colour-bar cameras
    TestPattern,
}

impl Default for CameraBackendType {
    fn default() -> Self {
        if cfg!(all(target_os = "linux", feature = "v4l2")) {
            CameraBackendType::V4l2
        } else {
            CameraBackendType::TestPattern
        }
    }
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::TestPattern => write!(f, "test pattern"),
        }
    }
}

/// Kind of an enumerated device
///
/// Only video inputs are ever surfaced to the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    #[serde(rename = "videoinput")]
    VideoInput,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::VideoInput => "videoinput",
        }
    }
}

/// Represents a camera device
///
/// Labels may be empty or generic until the user has granted camera access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDevice {
    /// Opaque backend identifier (device node path, synthetic id, ...)
    pub device_id: String,
    /// Human-readable name
    pub label: String,
    pub kind: DeviceKind,
}

impl CaptureDevice {
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }

    /// Label for display, falling back to the id when the label is withheld
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.device_id
        } else {
            &self.label
        }
    }
}

/// Shared cancellation flag for an in-flight acquisition
pub type CancelFlag = Arc<AtomicBool>;

/// Parameters for a stream acquisition
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Device to bind; `None` lets the backend pick its default camera
    pub device_id: Option<String>,
    /// Whether an audio track is requested alongside video
    pub audio: bool,
    /// Raised when the request has been superseded
    pub cancel: CancelFlag,
}

impl StreamRequest {
    pub fn new(device_id: Option<String>, audio: bool) -> Self {
        Self {
            device_id,
            audio,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check whether the requester has given up on this acquisition
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// A still of the live preview, tightly packed RGBA8
#[derive(Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
    pub captured_at: Instant,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, rgba: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            rgba: rgba.into(),
            captured_at: Instant::now(),
        }
    }

    /// Number of bytes a frame of this size must carry
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Notifications emitted by a stream recorder
#[derive(Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// One encoded chunk, in order
    DataAvailable(Vec<u8>),
    /// The recorder has flushed its last chunk; no more events follow
    Stopped,
}

impl std::fmt::Debug for RecorderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecorderEvent::DataAvailable(chunk) => {
                write!(f, "DataAvailable({} bytes)", chunk.len())
            }
            RecorderEvent::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Sending half of a recorder's event channel
pub type RecorderEventSender = futures::channel::mpsc::UnboundedSender<RecorderEvent>;

/// Receiving half of a recorder's event channel
pub type RecorderEventReceiver = futures::channel::mpsc::UnboundedReceiver<RecorderEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_kind_serializes_as_videoinput() {
        let device = CaptureDevice::video_input("cam1", "Front");
        let json = serde_json::to_string(&device).unwrap();
        assert!(json.contains("\"kind\":\"videoinput\""));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let device = CaptureDevice::video_input("cam1", "");
        assert_eq!(device.display_name(), "cam1");
    }

    #[test]
    fn test_stream_request_cancellation() {
        let request = StreamRequest::new(Some("cam1".into()), false);
        assert!(!request.is_cancelled());
        request.cancel.store(true, Ordering::Release);
        assert!(request.is_cancelled());
    }
}
