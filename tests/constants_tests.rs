// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_booth::constants::{EncodingQuality, TIMESTAMP_FORMAT};

#[test]
fn test_encoding_quality_values() {
    assert_eq!(EncodingQuality::ALL.len(), 4);
}

#[test]
fn test_encoding_quality_ordering() {
    // Presets are ordered from lowest to highest quality
    let mut prev = 0u8;
    for preset in EncodingQuality::ALL {
        let quality = preset.jpeg_quality();
        assert!(quality > prev, "Presets should be ordered from lowest to highest");
        assert!(quality <= 100);
        prev = quality;
    }
}

#[test]
fn test_encoding_quality_display_names() {
    for preset in EncodingQuality::ALL {
        let name = preset.display_name();
        assert!(!name.is_empty(), "Preset {:?} has empty display name", preset);
    }
}

#[test]
fn test_timestamp_format_is_human_readable() {
    let stamp = chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
        .and_then(|d| d.and_hms_opt(7, 5, 0))
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string());
    assert_eq!(stamp.as_deref(), Some("2024-03-09 07:05:00"));
}
