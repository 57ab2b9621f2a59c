// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos
//! - Recording videos
//! - Listing, deleting and exporting gallery items
//!
//! Capture commands drive the same [`CameraApp`] state container a UI would,
//! through the headless [`Runtime`].

use camera_booth::app::{CameraApp, CaptureMode, Message, Runtime};
use camera_booth::backends::camera::{CameraBackendType, get_backend_for_type};
use camera_booth::config::{Config, ConfigHandler};
use camera_booth::constants::{APP_DIR_NAME, timing};
use camera_booth::gallery::GalleryStore;
use camera_booth::storage::FileStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// How long to wait for a photo or video to be stored
const SAVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Loaded settings and the gallery location
struct Context {
    config: Config,
    handler: Option<ConfigHandler>,
    store: FileStore,
}

fn load_context() -> Result<Context, Box<dyn std::error::Error>> {
    let handler = match ConfigHandler::new() {
        Ok(handler) => Some(handler),
        Err(e) => {
            warn!(error = %e, "Config unavailable, using defaults");
            None
        }
    };

    let config = match handler.as_ref().map(ConfigHandler::load) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
        None => Config::default(),
    };

    let store = match &config.gallery_dir {
        Some(dir) => FileStore::new(dir),
        None => FileStore::default_location().ok_or("No data directory available")?,
    };

    Ok(Context {
        config,
        handler,
        store,
    })
}

fn open_gallery() -> Result<GalleryStore, Box<dyn std::error::Error>> {
    let ctx = load_context()?;
    Ok(GalleryStore::load(Box::new(ctx.store)))
}

fn build_tokio() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Build the app, wait for the initial enumeration and apply the camera choice
async fn start_app(
    ctx: Context,
    backend: Option<CameraBackendType>,
    camera: Option<&str>,
) -> Result<Runtime, Box<dyn std::error::Error>> {
    let backend_type = backend.unwrap_or(ctx.config.backend);
    let (app, init) = CameraApp::init(
        ctx.config,
        ctx.handler,
        get_backend_for_type(backend_type),
        Box::new(ctx.store),
    );
    let mut runtime = Runtime::new(app, init);
    runtime.settle(timing::SETTLE_QUIET).await;

    if let Some(camera) = camera {
        let devices = runtime.app().session().devices();
        let device_id = camera
            .parse::<usize>()
            .ok()
            .and_then(|index| devices.get(index))
            .or_else(|| devices.iter().find(|d| d.device_id == camera))
            .map(|d| d.device_id.clone())
            .ok_or_else(|| format!("Camera '{}' not found", camera))?;
        runtime.dispatch(Message::SelectDevice(device_id));
    }

    Ok(runtime)
}

/// Turn the camera on and wait for the first frame
async fn start_camera(runtime: &mut Runtime) -> CliResult {
    runtime.dispatch(Message::StartCamera);

    let opened = runtime
        .run_until(
            |app| app.session().is_active() || !app.is_camera_active(),
            timing::FIRST_FRAME_TIMEOUT,
        )
        .await;
    if !opened || !runtime.app().session().is_active() {
        return Err("Camera unavailable (busy, disconnected or permission denied)".into());
    }

    if let Some(device) = runtime.app().session().selected_device() {
        println!("Using camera: {}", device.display_name());
    }

    let ready = runtime
        .run_until(
            |app| app.session().stream().is_some_and(|s| s.frame_ready()),
            timing::FIRST_FRAME_TIMEOUT,
        )
        .await;
    if !ready {
        return Err("No frames received from camera".into());
    }

    Ok(())
}

/// List all available cameras
pub fn list_cameras(backend: Option<CameraBackendType>) -> CliResult {
    let ctx = load_context()?;
    build_tokio()?.block_on(list_cameras_async(ctx, backend))
}

async fn list_cameras_async(ctx: Context, backend: Option<CameraBackendType>) -> CliResult {
    let runtime = start_app(ctx, backend, None).await?;
    let app = runtime.app();
    let devices = app.session().devices();

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", app.session().backend_type());
    println!();
    for (index, device) in devices.iter().enumerate() {
        let marker = if app.session().selected_device_id() == Some(device.device_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} [{}] {}", marker, index, device.display_name());
        println!("      Id: {}", device.device_id);
    }

    Ok(())
}

/// Take a photo with the selected camera
pub fn take_photo(backend: Option<CameraBackendType>, camera: Option<String>) -> CliResult {
    let ctx = load_context()?;
    build_tokio()?.block_on(take_photo_async(ctx, backend, camera))
}

async fn take_photo_async(
    ctx: Context,
    backend: Option<CameraBackendType>,
    camera: Option<String>,
) -> CliResult {
    let mut runtime = start_app(ctx, backend, camera.as_deref()).await?;
    runtime.dispatch(Message::SetMode(CaptureMode::Photo));
    start_camera(&mut runtime).await?;

    // Let auto exposure settle
    runtime.run_for(timing::CAMERA_WARMUP).await;

    let before = runtime.app().gallery().len();
    println!("Capturing photo...");
    runtime.dispatch(Message::CapturePhoto);
    runtime
        .run_until(|app| !app.is_capturing(), SAVE_TIMEOUT)
        .await;
    runtime.dispatch(Message::StopCamera);

    let gallery = runtime.app().gallery();
    if gallery.len() <= before {
        return Err("Photo capture failed".into());
    }
    if let Some(record) = gallery.records().first() {
        println!("Photo saved: {} ({})", record.id, record.timestamp);
    }

    Ok(())
}

/// Record a video with the selected camera
pub fn record_video(
    backend: Option<CameraBackendType>,
    camera: Option<String>,
    duration: u64,
    audio: bool,
) -> CliResult {
    let ctx = load_context()?;
    build_tokio()?.block_on(record_video_async(ctx, backend, camera, duration, audio))
}

async fn record_video_async(
    ctx: Context,
    backend: Option<CameraBackendType>,
    camera: Option<String>,
    duration: u64,
    audio: bool,
) -> CliResult {
    let mut runtime = start_app(ctx, backend, camera.as_deref()).await?;
    runtime.dispatch(Message::OverrideRecordAudio(audio));
    runtime.dispatch(Message::SetMode(CaptureMode::Video));
    start_camera(&mut runtime).await?;

    let before = runtime.app().gallery().len();
    runtime.dispatch(Message::StartRecording);
    if !runtime.app().recording().is_recording() {
        return Err("Failed to start recording".into());
    }

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!("Recording... (press Ctrl+C to stop early)");
    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);

    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        runtime.run_for(Duration::from_millis(100)).await;
    }
    println!();

    runtime.dispatch(Message::StopRecording);
    runtime
        .run_until(|app| !app.recording().is_recording(), SAVE_TIMEOUT)
        .await;
    runtime.dispatch(Message::StopCamera);

    let gallery = runtime.app().gallery();
    if gallery.len() <= before {
        return Err("Recording produced no video".into());
    }
    if let Some(record) = gallery.records().first() {
        println!("Video saved: {} ({})", record.id, record.timestamp);
    }

    Ok(())
}

/// List gallery items, newest first
pub fn gallery_list() -> CliResult {
    let gallery = open_gallery()?;

    if gallery.is_empty() {
        println!("Gallery is empty.");
        return Ok(());
    }

    for record in gallery.records() {
        println!(
            "{}  {:<5}  {}  {}",
            record.id,
            record.kind,
            record.timestamp,
            record.payload.mime_type().unwrap_or("unknown")
        );
    }

    Ok(())
}

/// Delete a gallery item by id
pub fn gallery_delete(id: &str) -> CliResult {
    let mut gallery = open_gallery()?;

    if !gallery.delete(id)? {
        return Err(format!("No media with id {}", id).into());
    }

    println!("Deleted {}", id);
    Ok(())
}

/// Write a gallery item's payload to disk
pub fn gallery_export(id: &str, output: Option<PathBuf>, open_after: bool) -> CliResult {
    let gallery = open_gallery()?;
    let record = gallery
        .get(id)
        .ok_or_else(|| format!("No media with id {}", id))?;
    let data = record.payload.decode()?;

    let path = match output {
        Some(path) if path.is_dir() => path.join(record.file_name()),
        Some(path) => path,
        None => dirs::picture_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join(record.file_name()),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &data)?;
    println!("Exported: {} ({} bytes)", path.display(), data.len());

    if open_after && let Err(e) = open::that(&path) {
        warn!(error = %e, path = %path.display(), "Failed to open exported file");
    }

    Ok(())
}
