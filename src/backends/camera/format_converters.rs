// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion utilities for capture backends
//!
//! Backends hand preview frames to the rest of the crate as tightly packed
//! RGBA8. Packed YUV 4:2:2 sources are converted with BT.601 coefficients;
//! MJPEG sources are decoded with the `image` crate.

/// Byte order of a packed YUV 4:2:2 macropixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Yuv422Layout {
    /// Y0 U Y1 V
    Yuyv,
    /// U Y0 V Y1
    Uyvy,
}

/// Convert packed YUV 4:2:2 to RGBA
///
/// Each 4-byte group encodes 2 pixels. Output is truncated to `width * height`
/// pixels even if the source buffer carries trailing padding.
pub fn yuv422_to_rgba(data: &[u8], width: u32, height: u32, layout: Yuv422Layout) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let (y0, u, y1, v) = match layout {
            Yuv422Layout::Yuyv => (chunk[0], chunk[1], chunk[2], chunk[3]),
            Yuv422Layout::Uyvy => (chunk[1], chunk[0], chunk[3], chunk[2]),
        };
        let u = u as f32 - 128.0;
        let v = v as f32 - 128.0;

        for y in [y0 as f32, y1 as f32] {
            if rgba.len() >= pixel_count * 4 {
                return rgba;
            }
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }

    rgba
}

/// Decode an MJPEG frame to RGBA
///
/// Returns (rgba, width, height), or `None` if the frame is not a valid JPEG
/// (cameras occasionally deliver truncated frames right after stream start).
pub fn mjpeg_to_rgba(data: &[u8]) -> Option<(Vec<u8>, u32, u32)> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg).ok()?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Some((rgba.into_raw(), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_grey_maps_to_grey() {
        // Neutral chroma: Y=128 U=128 Y=128 V=128 -> two mid-grey pixels
        let data = [128u8, 128, 128, 128];
        let rgba = yuv422_to_rgba(&data, 2, 1, Yuv422Layout::Yuyv);
        assert_eq!(rgba, vec![128, 128, 128, 255, 128, 128, 128, 255]);
    }

    #[test]
    fn test_uyvy_byte_order() {
        // Same pixels as above but with a bright second luma sample
        let data = [128u8, 0, 128, 255];
        let rgba = yuv422_to_rgba(&data, 2, 1, Yuv422Layout::Uyvy);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 255]);
        assert_eq!(&rgba[4..8], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_output_truncated_to_frame_size() {
        let data = [16u8; 16];
        let rgba = yuv422_to_rgba(&data, 2, 1, Yuv422Layout::Yuyv);
        assert_eq!(rgba.len(), 8);
    }

    #[test]
    fn test_invalid_mjpeg_is_rejected() {
        assert!(mjpeg_to_rgba(&[0xFF, 0xD8, 0x00]).is_none());
    }
}
