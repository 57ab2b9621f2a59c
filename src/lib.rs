// SPDX-License-Identifier: MPL-2.0

//! Camera Booth - camera preview, photo/video capture and a local media gallery
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: The [`CameraApp`] state container, its messages and runtime
//! - [`backends`]: Camera backend abstraction (V4L2, test pattern) and the
//!   device session manager
//! - [`pipelines`]: Photo encoding and recording buffers
//! - [`gallery`]: Persisted, newest-first collection of captured media
//! - [`storage`]: Key-value stores the gallery is persisted to
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use camera_booth::app::{CameraApp, Message, Runtime};
//! use camera_booth::backends::camera::test_pattern::TestPatternBackend;
//! use camera_booth::storage::MemoryStore;
//! use camera_booth::Config;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() {
//! let (app, init) = CameraApp::init(
//!     Config::default(),
//!     None,
//!     Arc::new(TestPatternBackend::new()),
//!     Box::new(MemoryStore::new()),
//! );
//! let mut runtime = Runtime::new(app, init);
//! runtime.dispatch(Message::StartCamera);
//! runtime.settle(Duration::from_millis(50)).await;
//! runtime.dispatch(Message::CapturePhoto);
//! runtime.settle(Duration::from_millis(50)).await;
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod gallery;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{CameraApp, CaptureMode, Message, ViewState};
pub use config::Config;
pub use gallery::{GalleryStore, MediaKind, MediaRecord};
