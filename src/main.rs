// SPDX-License-Identifier: GPL-3.0-only

use camera_booth::backends::camera::CameraBackendType;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-booth")]
#[command(about = "Camera preview, photo/video capture and a local media gallery")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Camera backend (default: from config)
    #[arg(short, long, global = true)]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    V4l2,
    TestPattern,
}

impl From<BackendArg> for CameraBackendType {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::V4l2 => CameraBackendType::V4l2,
            BackendArg::TestPattern => CameraBackendType::TestPattern,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo and add it to the gallery
    Photo {
        /// Camera index or id (from 'camera-booth list')
        #[arg(short, long)]
        camera: Option<String>,
    },

    /// Record a video and add it to the gallery
    Video {
        /// Camera index or id (from 'camera-booth list')
        #[arg(short, long)]
        camera: Option<String>,

        /// Recording duration in seconds (Ctrl+C stops early)
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Request an audio track
        #[arg(short, long)]
        audio: bool,
    },

    /// Browse the media gallery
    Gallery {
        #[command(subcommand)]
        command: GalleryCommands,
    },
}

#[derive(Subcommand)]
enum GalleryCommands {
    /// List captured media, newest first
    List,

    /// Delete a gallery item
    Delete {
        /// Media id (from 'camera-booth gallery list')
        id: String,
    },

    /// Write a gallery item to a file
    Export {
        /// Media id (from 'camera-booth gallery list')
        id: String,

        /// Output file or directory (default: ~/Pictures/camera-booth)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the exported file with the default application
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_booth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let backend = cli.backend.map(CameraBackendType::from);

    match cli.command {
        Commands::List => cli::list_cameras(backend),
        Commands::Photo { camera } => cli::take_photo(backend, camera),
        Commands::Video {
            camera,
            duration,
            audio,
        } => cli::record_video(backend, camera, duration, audio),
        Commands::Gallery { command } => match command {
            GalleryCommands::List => cli::gallery_list(),
            GalleryCommands::Delete { id } => cli::gallery_delete(&id),
            GalleryCommands::Export { id, output, open } => cli::gallery_export(&id, output, open),
        },
    }
}
