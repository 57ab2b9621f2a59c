// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 capture backend
//!
//! Uses the v4l crate to stream memory-mapped buffers from `/dev/video*` on a
//! dedicated capture thread. MJPG is preferred (the buffers double as recorder
//! chunks), YUYV/UYVY are converted and JPEG-encoded when recording.
//! V4L2 nodes carry no audio, so audio requests are acknowledged but ignored.

use super::format_converters::{Yuv422Layout, mjpeg_to_rgba, yuv422_to_rgba};
use super::types::*;
use super::{CameraBackend, MediaStream, RecorderControl, RecorderHandle};
use crate::constants::{EncodingQuality, MJPEG_MIME_TYPE, capture};
use crate::errors::{BackendResult, CameraError, RecordingError};
use crate::pipelines::photo::{EncodingFormat, encode_frame};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Pixel layout of captured buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelLayout {
    Mjpeg,
    Yuv422(Yuv422Layout),
}

impl PixelLayout {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"MJPG" | b"JPEG" => Some(PixelLayout::Mjpeg),
            b"YUYV" | b"YUY2" => Some(PixelLayout::Yuv422(Yuv422Layout::Yuyv)),
            b"UYVY" => Some(PixelLayout::Yuv422(Yuv422Layout::Uyvy)),
            _ => None,
        }
    }
}

/// Preferred capture formats, best first
const PREFERRED_FOURCCS: [&[u8; 4]; 3] = [b"MJPG", b"YUYV", b"UYVY"];

/// Raw captured buffer
#[derive(Clone)]
struct RawFrame {
    layout: PixelLayout,
    width: u32,
    height: u32,
    data: Arc<[u8]>,
}

impl RawFrame {
    fn to_rgba(&self) -> Option<VideoFrame> {
        match self.layout {
            PixelLayout::Mjpeg => {
                let (rgba, width, height) = mjpeg_to_rgba(&self.data)?;
                Some(VideoFrame::new(width, height, rgba))
            }
            PixelLayout::Yuv422(layout) => {
                let rgba = yuv422_to_rgba(&self.data, self.width, self.height, layout);
                Some(VideoFrame::new(self.width, self.height, rgba))
            }
        }
    }

    /// One Motion-JPEG chunk for this frame
    fn to_jpeg(&self) -> Option<Vec<u8>> {
        match self.layout {
            PixelLayout::Mjpeg => Some(self.data.to_vec()),
            PixelLayout::Yuv422(_) => {
                let frame = self.to_rgba()?;
                match encode_frame(&frame, EncodingFormat::Jpeg, EncodingQuality::Medium) {
                    Ok(encoded) => Some(encoded.data),
                    Err(e) => {
                        warn!(error = %e, "Failed to encode recorder frame");
                        None
                    }
                }
            }
        }
    }
}

/// State shared between a stream handle and its capture thread
struct SharedCapture {
    running: AtomicBool,
    latest: Mutex<Option<RawFrame>>,
    /// Recorder sender, read by the capture thread for every frame
    recorder: Mutex<Option<RecorderEventSender>>,
}

impl SharedCapture {
    fn publish(&self, frame: RawFrame) {
        {
            let recorder = self.recorder.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(sender) = recorder.as_ref()
                && let Some(chunk) = frame.to_jpeg()
                && sender
                    .unbounded_send(RecorderEvent::DataAvailable(chunk))
                    .is_err()
            {
                debug!("Recorder receiver dropped");
            }
        }
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
    }

    /// Emit `Stopped` to the active recorder, if any
    fn stop_recorder(&self) {
        let sender = self
            .recorder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.unbounded_send(RecorderEvent::Stopped);
        }
    }
}

/// V4L2 camera backend
#[derive(Debug, Default, Clone)]
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

/// List video capture nodes
///
/// Nodes that cannot be opened or only expose metadata are skipped.
fn enumerate_capture_nodes() -> Vec<CaptureDevice> {
    let mut devices = Vec::new();

    for node in v4l::context::enum_devices() {
        let path = node.path().to_string_lossy().to_string();

        let dev = match Device::with_path(node.path()) {
            Ok(dev) => dev,
            Err(e) => {
                debug!(path = %path, error = %e, "Skipping V4L2 node");
                continue;
            }
        };

        let caps = match dev.query_caps() {
            Ok(caps) => caps,
            Err(e) => {
                debug!(path = %path, error = %e, "QUERYCAP failed");
                continue;
            }
        };

        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            continue;
        }

        debug!(path = %path, card = %caps.card, driver = %caps.driver, "Found V4L2 camera");
        devices.push(CaptureDevice::video_input(path, caps.card));
    }

    devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
    devices
}

#[async_trait]
impl CameraBackend for V4l2Backend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    async fn enumerate_devices(&self) -> BackendResult<Vec<CaptureDevice>> {
        tokio::task::spawn_blocking(enumerate_capture_nodes)
            .await
            .map_err(|e| CameraError::EnumerationFailed(e.to_string()))
    }

    async fn acquire_stream(&self, request: StreamRequest) -> BackendResult<Box<dyn MediaStream>> {
        if request.is_cancelled() {
            return Err(CameraError::Cancelled);
        }

        let device_path = match request.device_id.clone() {
            Some(path) => path,
            None => self
                .enumerate_devices()
                .await?
                .into_iter()
                .next()
                .map(|d| d.device_id)
                .ok_or_else(|| CameraError::DeviceNotFound("No cameras found".to_string()))?,
        };

        if request.audio {
            debug!(device = %device_path, "V4L2 nodes carry no audio; continuing video-only");
        }

        let shared = Arc::new(SharedCapture {
            running: AtomicBool::new(true),
            latest: Mutex::new(None),
            recorder: Mutex::new(None),
        });

        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let thread_shared = Arc::clone(&shared);
        let thread_path = device_path.clone();
        let cancel = Arc::clone(&request.cancel);

        let thread = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || capture_loop(&thread_path, thread_shared, ready_tx, cancel))
            .map_err(|e| CameraError::AcquisitionFailed(e.to_string()))?;

        let negotiated = ready_rx.await.map_err(|_| {
            CameraError::AcquisitionFailed(format!("{}: capture thread exited", device_path))
        })?;

        let (width, height) = match negotiated {
            Ok(size) => size,
            Err(e) => {
                let _ = thread.join();
                return Err(e);
            }
        };

        info!(device = %device_path, width, height, "V4L2 stream started");

        Ok(Box::new(V4l2Stream {
            device_id: device_path,
            shared,
            thread: Some(thread),
        }))
    }
}

/// Open the device, negotiate a format and stream until told to stop
///
/// The first captured frame (or the first error) resolves `ready`, so device
/// busy / permission errors surface as acquisition failures.
fn capture_loop(
    device_path: &str,
    shared: Arc<SharedCapture>,
    ready: tokio::sync::oneshot::Sender<BackendResult<(u32, u32)>>,
    cancel: CancelFlag,
) {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    if cancel.load(Ordering::Acquire) {
        let _ = ready.send(Err(CameraError::Cancelled));
        return;
    }

    let dev = match Device::with_path(device_path) {
        Ok(dev) => dev,
        Err(e) => {
            let _ = ready.send(Err(CameraError::from_io(device_path, &e)));
            return;
        }
    };

    let format = match negotiate_format(&dev) {
        Ok(format) => format,
        Err(e) => {
            let _ = ready.send(Err(CameraError::from_io(device_path, &e)));
            return;
        }
    };

    let Some(layout) = PixelLayout::from_fourcc(format.fourcc) else {
        let _ = ready.send(Err(CameraError::AcquisitionFailed(format!(
            "{}: unsupported pixel format {}",
            device_path, format.fourcc
        ))));
        return;
    };

    info!(
        device_path,
        width = format.width,
        height = format.height,
        fourcc = %format.fourcc,
        "Negotiated V4L2 format"
    );

    let mut stream =
        match MmapStream::with_buffers(&dev, Type::VideoCapture, capture::V4L2_BUFFER_COUNT) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(CameraError::from_io(device_path, &e)));
                return;
            }
        };

    let mut ready = Some(ready);

    while shared.running.load(Ordering::Acquire) {
        match stream.next() {
            Ok((buf, meta)) => {
                let used = match meta.bytesused as usize {
                    0 => buf.len(),
                    n => n.min(buf.len()),
                };
                shared.publish(RawFrame {
                    layout,
                    width: format.width,
                    height: format.height,
                    data: Arc::from(&buf[..used]),
                });

                if let Some(ready) = ready.take()
                    && ready.send(Ok((format.width, format.height))).is_err()
                {
                    debug!(device_path, "Acquisition abandoned before first frame");
                    shared.running.store(false, Ordering::Release);
                }

                let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                if frame_num % 300 == 0 {
                    debug!(frame = frame_num, size = used, "V4L2 frame captured");
                }
            }
            Err(e) => {
                if let Some(ready) = ready.take() {
                    let _ = ready.send(Err(CameraError::from_io(device_path, &e)));
                    shared.running.store(false, Ordering::Release);
                    break;
                }
                warn!(error = %e, "Failed to capture V4L2 frame");
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        }
    }

    shared.stop_recorder();
    info!(device_path, "V4L2 capture loop ended");
}

/// Switch the device to the best supported format
fn negotiate_format(dev: &Device) -> std::io::Result<v4l::Format> {
    let mut format = dev.format()?;
    let available = dev.enum_formats().unwrap_or_default();

    let preferred = PREFERRED_FOURCCS
        .iter()
        .map(|repr| FourCC::new(repr))
        .find(|fourcc| available.iter().any(|f| f.fourcc == *fourcc));

    match preferred {
        Some(fourcc) if fourcc != format.fourcc => {
            format.fourcc = fourcc;
            dev.set_format(&format)
        }
        _ => Ok(format),
    }
}

/// A live V4L2 stream
pub struct V4l2Stream {
    device_id: String,
    shared: Arc<SharedCapture>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MediaStream for V4l2Stream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn has_audio(&self) -> bool {
        false
    }

    fn is_live(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    fn frame_ready(&self) -> bool {
        self.shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn snapshot(&self) -> Option<VideoFrame> {
        if !self.is_live() {
            return None;
        }
        let raw = self
            .shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        raw.to_rgba()
    }

    fn start_recorder(&mut self) -> Result<RecorderHandle, RecordingError> {
        if !self.is_live() {
            return Err(RecordingError::StartFailed("stream is stopped".to_string()));
        }

        let mut recorder = self
            .shared
            .recorder
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if recorder.is_some() {
            return Err(RecordingError::StartFailed(
                "recorder already running".to_string(),
            ));
        }

        let (sender, events) = futures::channel::mpsc::unbounded();
        *recorder = Some(sender);

        Ok(RecorderHandle {
            control: Box::new(V4l2RecorderControl {
                shared: Arc::clone(&self.shared),
            }),
            events,
            mime_type: MJPEG_MIME_TYPE.to_string(),
        })
    }

    fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);

        // The capture thread can sit in a blocking dequeue; never join it here
        if let Some(handle) = self.thread.take() {
            info!(device = %self.device_id, "Stopping V4L2 stream");
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                let device_id = self.device_id.clone();
                runtime.spawn_blocking(move || {
                    if handle.join().is_err() {
                        error!(device = %device_id, "V4L2 capture thread panicked");
                    }
                });
            }
        }

        *self
            .shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        // Don't wait for the thread in drop
        self.shared.running.store(false, Ordering::Release);
    }
}

struct V4l2RecorderControl {
    shared: Arc<SharedCapture>,
}

impl RecorderControl for V4l2RecorderControl {
    fn request_stop(&mut self) {
        self.shared.stop_recorder();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_layout_from_fourcc() {
        assert_eq!(
            PixelLayout::from_fourcc(FourCC::new(b"MJPG")),
            Some(PixelLayout::Mjpeg)
        );
        assert_eq!(
            PixelLayout::from_fourcc(FourCC::new(b"YUYV")),
            Some(PixelLayout::Yuv422(Yuv422Layout::Yuyv))
        );
        assert_eq!(PixelLayout::from_fourcc(FourCC::new(b"H264")), None);
    }

    #[test]
    fn test_yuyv_frame_converts_to_rgba() {
        let raw = RawFrame {
            layout: PixelLayout::Yuv422(Yuv422Layout::Yuyv),
            width: 2,
            height: 1,
            data: Arc::from(vec![128u8, 128, 128, 128]),
        };
        let frame = raw.to_rgba().unwrap();
        assert_eq!(frame.rgba.len(), frame.expected_len());
        assert_eq!(raw.to_jpeg().map(|j| j[0..2].to_vec()), Some(vec![0xFF, 0xD8]));
    }

    #[tokio::test]
    async fn test_stop_does_not_wait_for_stalled_capture_thread() {
        let shared = Arc::new(SharedCapture {
            running: AtomicBool::new(true),
            latest: Mutex::new(None),
            recorder: Mutex::new(None),
        });
        // Stands in for a dequeue that never returns
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let thread = std::thread::spawn(move || {
            let _ = release_rx.recv();
        });

        let mut stream = V4l2Stream {
            device_id: "/dev/video9".to_string(),
            shared,
            thread: Some(thread),
        };

        let started = std::time::Instant::now();
        stream.stop();
        assert!(started.elapsed() < std::time::Duration::from_millis(500));
        assert!(!stream.is_live());
        assert!(stream.thread.is_none());

        release_tx.send(()).unwrap();
    }
}
