// SPDX-License-Identifier: GPL-3.0-only

//! Gallery records and their self-contained payloads

use crate::constants::{MJPEG_MIME_TYPE, TIMESTAMP_FORMAT};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Photo or video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Payload that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Payload is not a base64 data URL")]
    NotDataUrl,
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// A `data:<mime>;base64,<bytes>` URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataUrl(String);

impl DataUrl {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime_type, BASE64.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> Result<(&str, &str), PayloadError> {
        let rest = self.0.strip_prefix("data:").ok_or(PayloadError::NotDataUrl)?;
        let (header, body) = rest.split_once(',').ok_or(PayloadError::NotDataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(PayloadError::NotDataUrl)?;
        Ok((mime, body))
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.split().ok().map(|(mime, _)| mime)
    }

    /// Decode the embedded bytes
    pub fn decode(&self) -> Result<Vec<u8>, PayloadError> {
        let (_, body) = self.split()?;
        BASE64
            .decode(body)
            .map_err(|e| PayloadError::InvalidBase64(e.to_string()))
    }
}

/// One captured photo or video
///
/// Serialized as `{"id", "type", "payload", "timestamp"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub payload: DataUrl,
    /// Local capture time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
}

impl MediaRecord {
    /// New record stamped with a fresh id and the current local time
    pub fn new(kind: MediaKind, mime_type: &str, data: &[u8]) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            payload: DataUrl::from_bytes(mime_type, data),
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn photo(mime_type: &str, data: &[u8]) -> Self {
        Self::new(MediaKind::Photo, mime_type, data)
    }

    pub fn video(mime_type: &str, data: &[u8]) -> Self {
        Self::new(MediaKind::Video, mime_type, data)
    }

    /// File extension matching the payload's MIME type
    pub fn file_extension(&self) -> &'static str {
        match self.payload.mime_type() {
            Some("image/jpeg") => "jpg",
            Some("image/png") => "png",
            Some(MJPEG_MIME_TYPE) => "mjpeg",
            _ => match self.kind {
                MediaKind::Photo => "img",
                MediaKind::Video => "video",
            },
        }
    }

    /// Suggested file name for exporting this record
    pub fn file_name(&self) -> String {
        let stamp = self.timestamp.replace([' ', ':'], "-");
        format!("{}_{}.{}", self.kind, stamp, self.file_extension())
    }
}
