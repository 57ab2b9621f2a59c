// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test pattern cameras
//!
//! Renders colour bars or a gradient with a moving sweep line, so the whole
//! capture flow can run without hardware. Recordings are Motion-JPEG: a worker
//! thread encodes one frame per tick and emits it as a recorder chunk.

use super::types::*;
use super::{CameraBackend, MediaStream, RecorderControl, RecorderHandle};
use crate::constants::{EncodingQuality, MJPEG_MIME_TYPE, capture, timing};
use crate::errors::{BackendResult, CameraError, RecordingError};
use crate::pipelines::photo::{EncodingFormat, encode_frame};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which picture a synthetic camera renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    ColorBars,
    Gradient,
}

const DEVICES: [(&str, &str, Pattern); 2] = [
    ("test-pattern:bars", "Test Pattern (Colour Bars)", Pattern::ColorBars),
    ("test-pattern:gradient", "Test Pattern (Gradient)", Pattern::Gradient),
];

/// 75% SMPTE-style bar colours, left to right
const BAR_COLORS: [[u8; 3]; 8] = [
    [191, 191, 191],
    [191, 191, 0],
    [0, 191, 191],
    [0, 191, 0],
    [191, 0, 191],
    [191, 0, 0],
    [0, 0, 191],
    [16, 16, 16],
];

/// Render one RGBA frame of `pattern` at animation step `tick`
pub fn render_pattern(pattern: Pattern, width: u32, height: u32, tick: u64) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let mut rgba = vec![0u8; w * h * 4];
    let sweep = if w == 0 { 0 } else { (tick as usize * 4) % w };

    for y in 0..h {
        for x in 0..w {
            let [r, g, b] = if x == sweep {
                [255, 255, 255]
            } else {
                match pattern {
                    Pattern::ColorBars => BAR_COLORS[(x * BAR_COLORS.len()) / w.max(1)],
                    Pattern::Gradient => [
                        ((x * 255) / w.max(1)) as u8,
                        ((y * 255) / h.max(1)) as u8,
                        ((tick * 8) % 256) as u8,
                    ],
                }
            };
            let idx = (y * w + x) * 4;
            rgba[idx..idx + 4].copy_from_slice(&[r, g, b, 255]);
        }
    }

    rgba
}

/// Backend serving the synthetic cameras
#[derive(Debug, Clone)]
pub struct TestPatternBackend {
    width: u32,
    height: u32,
}

impl TestPatternBackend {
    pub fn new() -> Self {
        Self::with_size(capture::TEST_PATTERN_WIDTH, capture::TEST_PATTERN_HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for TestPatternBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraBackend for TestPatternBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::TestPattern
    }

    async fn enumerate_devices(&self) -> BackendResult<Vec<CaptureDevice>> {
        Ok(DEVICES
            .iter()
            .map(|(id, label, _)| CaptureDevice::video_input(*id, *label))
            .collect())
    }

    async fn acquire_stream(&self, request: StreamRequest) -> BackendResult<Box<dyn MediaStream>> {
        if request.is_cancelled() {
            return Err(CameraError::Cancelled);
        }

        let device_id = request
            .device_id
            .clone()
            .unwrap_or_else(|| DEVICES[0].0.to_string());
        let pattern = DEVICES
            .iter()
            .find(|(id, _, _)| *id == device_id)
            .map(|(_, _, pattern)| *pattern)
            .ok_or_else(|| CameraError::DeviceNotFound(device_id.clone()))?;

        info!(
            device = %device_id,
            width = self.width,
            height = self.height,
            audio = request.audio,
            "Test pattern stream started"
        );

        Ok(Box::new(TestPatternStream {
            device_id,
            pattern,
            audio: request.audio,
            width: self.width,
            height: self.height,
            started_at: Instant::now(),
            live: Arc::new(AtomicBool::new(true)),
            recorder_stop: None,
        }))
    }
}

/// A live synthetic stream
pub struct TestPatternStream {
    device_id: String,
    pattern: Pattern,
    /// Silent audio track
    audio: bool,
    width: u32,
    height: u32,
    started_at: Instant,
    live: Arc<AtomicBool>,
    /// Stop flag of the running recorder thread
    recorder_stop: Option<Arc<AtomicBool>>,
}

impl TestPatternStream {
    fn tick(&self) -> u64 {
        let interval = timing::TEST_PATTERN_FRAME_INTERVAL.as_millis().max(1);
        (self.started_at.elapsed().as_millis() / interval) as u64
    }
}

impl MediaStream for TestPatternStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn has_audio(&self) -> bool {
        self.audio
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn frame_ready(&self) -> bool {
        self.is_live()
    }

    fn snapshot(&self) -> Option<VideoFrame> {
        if !self.is_live() {
            return None;
        }
        let rgba = render_pattern(self.pattern, self.width, self.height, self.tick());
        Some(VideoFrame::new(self.width, self.height, rgba))
    }

    fn start_recorder(&mut self) -> Result<RecorderHandle, RecordingError> {
        if !self.is_live() {
            return Err(RecordingError::StartFailed("stream is stopped".to_string()));
        }
        if self
            .recorder_stop
            .as_ref()
            .is_some_and(|stop| !stop.load(Ordering::Acquire))
        {
            return Err(RecordingError::StartFailed(
                "recorder already running".to_string(),
            ));
        }

        let (sender, events) = futures::channel::mpsc::unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let worker = RecorderWorker {
            pattern: self.pattern,
            width: self.width,
            height: self.height,
            started_at: self.started_at,
            live: Arc::clone(&self.live),
            stop: Arc::clone(&stop),
            sender,
        };

        std::thread::Builder::new()
            .name("test-pattern-recorder".to_string())
            .spawn(move || worker.run())
            .map_err(|e| RecordingError::StartFailed(e.to_string()))?;

        self.recorder_stop = Some(Arc::clone(&stop));

        Ok(RecorderHandle {
            control: Box::new(TestPatternRecorderControl { stop }),
            events,
            mime_type: MJPEG_MIME_TYPE.to_string(),
        })
    }

    fn stop(&mut self) {
        if self.live.swap(false, Ordering::AcqRel) {
            info!(device = %self.device_id, "Test pattern stream stopped");
        }
    }
}

impl Drop for TestPatternStream {
    fn drop(&mut self) {
        self.live.store(false, Ordering::Release);
    }
}

struct TestPatternRecorderControl {
    stop: Arc<AtomicBool>,
}

impl RecorderControl for TestPatternRecorderControl {
    fn request_stop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

struct RecorderWorker {
    pattern: Pattern,
    width: u32,
    height: u32,
    started_at: Instant,
    live: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    sender: RecorderEventSender,
}

impl RecorderWorker {
    fn run(self) {
        let interval = timing::TEST_PATTERN_FRAME_INTERVAL;
        let mut frames = 0u64;

        while self.live.load(Ordering::Acquire) && !self.stop.load(Ordering::Acquire) {
            let tick = (self.started_at.elapsed().as_millis() / interval.as_millis().max(1)) as u64;
            let frame = VideoFrame::new(
                self.width,
                self.height,
                render_pattern(self.pattern, self.width, self.height, tick),
            );

            match encode_frame(&frame, EncodingFormat::Jpeg, EncodingQuality::Medium) {
                Ok(encoded) => {
                    if self
                        .sender
                        .unbounded_send(RecorderEvent::DataAvailable(encoded.data))
                        .is_err()
                    {
                        debug!("Recorder event receiver dropped");
                        return;
                    }
                    frames += 1;
                }
                Err(e) => warn!(error = %e, "Failed to encode test pattern frame"),
            }

            std::thread::sleep(interval);
        }

        debug!(frames, "Test pattern recorder finished");
        let _ = self.sender.unbounded_send(RecorderEvent::Stopped);
    }
}
