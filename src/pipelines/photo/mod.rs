// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture pipeline
//!
//! Snapshots arrive as RGBA [`VideoFrame`]s at the preview's native
//! resolution; the pipeline encodes them off the event loop.

pub mod encoding;

pub use encoding::{EncodedImage, EncodingFormat, encode_frame};

use crate::backends::camera::types::VideoFrame;
use crate::constants::EncodingQuality;
use crate::errors::PhotoError;
use tracing::info;

/// Photo pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoPipeline {
    pub format: EncodingFormat,
    pub quality: EncodingQuality,
}

impl PhotoPipeline {
    pub fn new(format: EncodingFormat, quality: EncodingQuality) -> Self {
        Self { format, quality }
    }

    /// Encode a snapshot on a blocking worker
    pub async fn capture(self, frame: VideoFrame) -> Result<EncodedImage, PhotoError> {
        info!(
            width = frame.width,
            height = frame.height,
            format = ?self.format,
            "Encoding photo"
        );

        tokio::task::spawn_blocking(move || encode_frame(&frame, self.format, self.quality))
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("encoder task failed: {}", e)))?
    }
}
