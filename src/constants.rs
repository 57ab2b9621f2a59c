// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application directory name under the platform config/data/pictures dirs
pub const APP_DIR_NAME: &str = "camera-booth";

/// Key the gallery collection is persisted under
pub const GALLERY_STORAGE_KEY: &str = "camera-booth.gallery";

/// Human-readable capture timestamp format (local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// MIME type of recordings (concatenated JPEG frames)
pub const MJPEG_MIME_TYPE: &str = "video/x-motion-jpeg";

/// Photo encoding quality presets
///
/// Only affects JPEG output; PNG is always lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// High compression
    Low,
    /// Balanced
    Medium,
    /// Low compression (default)
    #[default]
    High,
    /// Minimal compression
    Maximum,
}

impl EncodingQuality {
    /// Get all preset variants, lowest quality first
    pub const ALL: [EncodingQuality; 4] = [
        EncodingQuality::Low,
        EncodingQuality::Medium,
        EncodingQuality::High,
        EncodingQuality::Maximum,
    ];

    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            EncodingQuality::Low => "Low",
            EncodingQuality::Medium => "Medium",
            EncodingQuality::High => "High",
            EncodingQuality::Maximum => "Maximum",
        }
    }
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Quiet period after which the runtime considers pending work settled
    pub const SETTLE_QUIET: Duration = Duration::from_millis(50);

    /// How long the CLI waits for the first preview frame
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Camera warm-up before a CLI photo is taken (auto exposure settles)
    pub const CAMERA_WARMUP: Duration = Duration::from_millis(500);

    /// Interval between test pattern recorder chunks (10 fps)
    pub const TEST_PATTERN_FRAME_INTERVAL: Duration = Duration::from_millis(100);
}

/// Capture-device constants
pub mod capture {
    /// Number of memory-mapped V4L2 buffers
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Test pattern frame size
    pub const TEST_PATTERN_WIDTH: u32 = 640;
    pub const TEST_PATTERN_HEIGHT: u32 = 480;
}
