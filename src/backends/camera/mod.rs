// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   App (CameraApp)    │
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ DeviceSessionManager │  ← Session lifecycle, request tokens
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CameraBackend trait  │  ← Enumeration + acquisition
//! └──────────┬───────────┘
//!            │
//!      ┌─────┴───────┐
//!      ▼             ▼
//!  ┌──────┐   ┌────────────┐
//!  │ V4L2 │   │TestPattern │
//!  └──────┘   └────────────┘
//! ```
//!
//! Acquisition hands out a [`MediaStream`], which doubles as the preview
//! sink (frame snapshots) and the source for a stream recorder.

pub mod format_converters;
pub mod manager;
pub mod test_pattern;
pub mod types;
#[cfg(all(target_os = "linux", feature = "v4l2"))]
pub mod v4l2;

pub use manager::{DeviceSessionManager, OpenOutcome, OpenRequest, SessionPhase, SessionToken};
pub use types::*;

use crate::errors::{BackendResult, RecordingError};
use async_trait::async_trait;
use std::sync::Arc;

/// Device enumeration and stream acquisition
///
/// Both calls are single-shot; the session manager never issues two
/// overlapping acquisitions for the same logical session.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Enumerate available video inputs
    async fn enumerate_devices(&self) -> BackendResult<Vec<CaptureDevice>>;

    /// Acquire a live stream for the requested device
    ///
    /// Backends should check [`StreamRequest::is_cancelled`] at convenient
    /// points and bail out with `CameraError::Cancelled`.
    async fn acquire_stream(&self, request: StreamRequest) -> BackendResult<Box<dyn MediaStream>>;
}

/// A live audio/video stream
pub trait MediaStream: Send {
    /// Device the stream is bound to
    fn device_id(&self) -> &str;

    /// Whether an audio track was acquired
    fn has_audio(&self) -> bool;

    /// Check if the tracks are still running
    fn is_live(&self) -> bool;

    /// Check if a preview frame has arrived yet
    fn frame_ready(&self) -> bool;

    /// Snapshot the current frame at native resolution
    ///
    /// Returns `None` until the first frame has arrived or after `stop`.
    fn snapshot(&self) -> Option<VideoFrame>;

    /// Start a recorder on this stream
    fn start_recorder(&mut self) -> Result<RecorderHandle, RecordingError>;

    /// Stop all tracks. Must be idempotent.
    fn stop(&mut self);
}

/// Control side of an active stream recorder
pub trait RecorderControl: Send {
    /// Ask the recorder to flush and stop
    ///
    /// The recorder may still deliver chunks after this call; completion is
    /// signalled by [`RecorderEvent::Stopped`].
    fn request_stop(&mut self);
}

/// An active stream recorder
pub struct RecorderHandle {
    pub control: Box<dyn RecorderControl>,
    pub events: RecorderEventReceiver,
    /// MIME type of the concatenated chunks
    pub mime_type: String,
}

impl std::fmt::Debug for RecorderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderHandle")
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Get a concrete backend instance for the given type
///
/// Falls back to the test pattern backend when V4L2 support is not compiled in.
pub fn get_backend_for_type(backend_type: CameraBackendType) -> Arc<dyn CameraBackend> {
    match backend_type {
        #[cfg(all(target_os = "linux", feature = "v4l2"))]
        CameraBackendType::V4l2 => Arc::new(v4l2::V4l2Backend::new()),
        #[cfg(not(all(target_os = "linux", feature = "v4l2")))]
        CameraBackendType::V4l2 => {
            tracing::warn!("V4L2 support not compiled in, using test pattern backend");
            Arc::new(test_pattern::TestPatternBackend::new())
        }
        CameraBackendType::TestPattern => Arc::new(test_pattern::TestPatternBackend::new()),
    }
}
