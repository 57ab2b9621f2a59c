// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! This module handles encoding RGBA preview frames to:
//! - JPEG (with quality control)
//! - PNG (lossless)

use crate::backends::camera::types::VideoFrame;
use crate::constants::EncodingQuality;
use crate::errors::PhotoError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Png => "image/png",
        }
    }
}

/// Encoded image data ready for the gallery
#[derive(Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Encode a frame at its native resolution
///
/// Blocking; callers on the event loop go through
/// [`PhotoPipeline::capture`](super::PhotoPipeline::capture).
pub fn encode_frame(
    frame: &VideoFrame,
    format: EncodingFormat,
    quality: EncodingQuality,
) -> Result<EncodedImage, PhotoError> {
    let expected = frame.expected_len();
    if frame.rgba.len() != expected {
        return Err(PhotoError::InvalidFrame {
            expected,
            actual: frame.rgba.len(),
        });
    }

    let image = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.to_vec()).ok_or(
        PhotoError::InvalidFrame {
            expected,
            actual: frame.rgba.len(),
        },
    )?;

    let mut data = Vec::new();
    match format {
        EncodingFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
            JpegEncoder::new_with_quality(&mut data, quality.jpeg_quality())
                .encode_image(&rgb)
                .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;
        }
        EncodingFormat::Png => {
            image
                .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
                .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;
        }
    }

    debug!(
        width = frame.width,
        height = frame.height,
        format = ?format,
        size = data.len(),
        "Frame encoded"
    );

    Ok(EncodedImage {
        data,
        format,
        width: frame.width,
        height: frame.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32) -> VideoFrame {
        let rgba: Vec<u8> = std::iter::repeat([200u8, 40, 40, 255])
            .take((width * height) as usize)
            .flatten()
            .collect();
        VideoFrame::new(width, height, rgba)
    }

    #[test]
    fn test_jpeg_output_has_soi_marker() {
        let encoded = encode_frame(&solid_frame(8, 4), EncodingFormat::Jpeg, EncodingQuality::High)
            .unwrap();
        assert_eq!(&encoded.data[0..2], &[0xFF, 0xD8]);
        assert_eq!((encoded.width, encoded.height), (8, 4));
    }

    #[test]
    fn test_png_keeps_native_resolution() {
        let encoded =
            encode_frame(&solid_frame(5, 3), EncodingFormat::Png, EncodingQuality::Low).unwrap();
        let decoded = image::load_from_memory(&encoded.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let frame = VideoFrame::new(4, 4, vec![0u8; 10]);
        let err = encode_frame(&frame, EncodingFormat::Png, EncodingQuality::High).unwrap_err();
        assert_eq!(
            err,
            PhotoError::InvalidFrame {
                expected: 64,
                actual: 10
            }
        );
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(EncodingFormat::Jpeg.extension(), "jpg");
        assert_eq!(EncodingFormat::Png.mime_type(), "image/png");
    }
}
