// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines
//!
//! - [`photo`]: snapshot encoding (JPEG/PNG)
//! - [`video`]: recorder chunk buffering and finalization

pub mod photo;
pub mod video;
