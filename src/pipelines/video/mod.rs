// SPDX-License-Identifier: MPL-2.0

//! Video recording pipeline
//!
//! Encoding is delegated to the stream's recorder; this side only buffers the
//! recorder's chunks and turns them into a single artifact.

pub mod recorder;

pub use recorder::{RecordingBuffer, RecordingSession, VideoArtifact};
