// SPDX-License-Identifier: MPL-2.0

//! Recording session and chunk buffer
//!
//! A [`RecordingSession`] owns the recorder control and the buffer the
//! recorder's chunks are accumulated into. Finalization happens from that
//! buffer when the recorder reports `Stopped`, so chunks flushed between the
//! stop request and the stop notification end up in the artifact.

use crate::backends::camera::RecorderControl;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Ordered binary chunks of an in-progress recording
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    chunks: Vec<Vec<u8>>,
    bytes: usize,
}

impl RecordingBuffer {
    pub fn push(&mut self, chunk: Vec<u8>) {
        self.bytes += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.bytes = 0;
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn byte_len(&self) -> usize {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Concatenate all chunks in order and leave the buffer empty
    pub fn take_concatenated(&mut self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.bytes);
        for chunk in self.chunks.drain(..) {
            data.extend_from_slice(&chunk);
        }
        self.bytes = 0;
        data
    }
}

/// A finalized recording
#[derive(Clone)]
pub struct VideoArtifact {
    pub mime_type: String,
    pub data: Vec<u8>,
    pub chunk_count: usize,
    pub duration: Duration,
}

impl std::fmt::Debug for VideoArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoArtifact")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .field("chunk_count", &self.chunk_count)
            .field("duration", &self.duration)
            .finish()
    }
}

/// One recording from start request to `Stopped`
pub struct RecordingSession {
    control: Box<dyn RecorderControl>,
    buffer: RecordingBuffer,
    mime_type: String,
    started_at: Instant,
    stop_requested: bool,
}

impl RecordingSession {
    /// Begin buffering for a freshly started recorder
    pub fn start(control: Box<dyn RecorderControl>, mime_type: String) -> Self {
        info!(mime_type = %mime_type, "Recording started");

        Self {
            control,
            buffer: RecordingBuffer::default(),
            mime_type,
            started_at: Instant::now(),
            stop_requested: false,
        }
    }

    /// Append a chunk delivered by the recorder
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        debug!(
            size = chunk.len(),
            buffered = self.buffer.chunk_count(),
            "Recorder chunk buffered"
        );
        self.buffer.push(chunk);
    }

    /// Ask the recorder to stop; only the first call is forwarded
    pub fn request_stop(&mut self) {
        if !self.stop_requested {
            self.stop_requested = true;
            self.control.request_stop();
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub fn buffer(&self) -> &RecordingBuffer {
        &self.buffer
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Build the artifact from everything buffered so far
    pub fn finish(mut self) -> VideoArtifact {
        let chunk_count = self.buffer.chunk_count();
        let data = self.buffer.take_concatenated();
        let duration = self.started_at.elapsed();

        info!(
            chunks = chunk_count,
            size = data.len(),
            duration_ms = duration.as_millis() as u64,
            "Recording finalized"
        );

        VideoArtifact {
            mime_type: self.mime_type,
            data,
            chunk_count,
            duration,
        }
    }
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("mime_type", &self.mime_type)
            .field("buffered_chunks", &self.buffer.chunk_count())
            .field("stop_requested", &self.stop_requested)
            .finish()
    }
}
