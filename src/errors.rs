// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera application
//!
//! Inside the [`CameraApp`](crate::app::CameraApp) state container every error
//! is logged and absorbed; these types exist so backends, storage and the CLI
//! can report *what* went wrong.

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for camera backend operations
pub type BackendResult<T> = Result<T, CameraError>;

/// Result type for key-value store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Main application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Other(String),
}

/// Device enumeration and stream acquisition failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The platform refused to list devices
    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),
    /// Access to the camera (or microphone) was denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Another process holds the device
    #[error("Camera is busy: {0}")]
    Busy(String),
    /// The device vanished or never existed
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Any other acquisition failure reported by the backend
    #[error("Stream acquisition failed: {0}")]
    AcquisitionFailed(String),
    /// The acquisition was superseded before it completed
    #[error("Stream acquisition cancelled")]
    Cancelled,
}

impl CameraError {
    /// Classify an I/O error raised while opening a capture device
    pub fn from_io(device: &str, err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        let detail = format!("{}: {}", device, err);
        match err.kind() {
            ErrorKind::PermissionDenied => CameraError::PermissionDenied(detail),
            ErrorKind::NotFound => CameraError::DeviceNotFound(detail),
            ErrorKind::ResourceBusy => CameraError::Busy(detail),
            _ => CameraError::AcquisitionFailed(detail),
        }
    }
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("Failed to start recording: {0}")]
    StartFailed(String),
    #[error("Recording is not supported by this stream: {0}")]
    NotSupported(String),
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    #[error("No frame available for capture")]
    NoFrameAvailable,
    #[error("Frame buffer is {actual} bytes, expected {expected}")]
    InvalidFrame { expected: usize, actual: usize },
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Persistent key-value store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The stored value could not be read
    #[error("Failed to read {key}: {reason}")]
    ReadFailed { key: String, reason: String },
    /// The stored value exists but does not parse
    #[error("Stored value for {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
    /// The value could not be written
    #[error("Failed to write {key}: {reason}")]
    WriteFailed { key: String, reason: String },
}

/// Configuration file errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("No configuration directory available")]
    NoConfigDir,
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Failed to write config: {0}")]
    Write(String),
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_errors_map_to_acquisition_taxonomy() {
        let denied = Error::from(ErrorKind::PermissionDenied);
        assert!(matches!(
            CameraError::from_io("/dev/video0", &denied),
            CameraError::PermissionDenied(_)
        ));

        let missing = Error::from(ErrorKind::NotFound);
        assert!(matches!(
            CameraError::from_io("/dev/video9", &missing),
            CameraError::DeviceNotFound(_)
        ));

        let busy = Error::from(ErrorKind::ResourceBusy);
        assert!(matches!(
            CameraError::from_io("/dev/video0", &busy),
            CameraError::Busy(_)
        ));
    }

    #[test]
    fn test_app_error_wraps_sub_errors() {
        let err: AppError = CameraError::Cancelled.into();
        assert_eq!(err.to_string(), "Camera error: Stream acquisition cancelled");

        let err: AppError = PhotoError::NoFrameAvailable.into();
        assert!(err.to_string().contains("No frame available"));
    }
}
