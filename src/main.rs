// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photo-capture")]
#[command(about = "Multi-shot photo capture sessions on a virtual camera")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Run a scripted capture session
    Session {
        /// Maximum number of images (default from config)
        #[arg(short, long)]
        max: Option<usize>,

        /// Comma-separated steps: capture, confirm, reject, import,
        /// cancel-import, flip, flash, zoom=F, slider=F, pinch=S, focus=X:Y,
        /// suspend, resume, continue, ack, cancel
        #[arg(short, long, default_value = "capture,confirm,continue")]
        script: String,

        /// Image file the virtual camera captures instead of a test pattern
        #[arg(long)]
        source: Option<PathBuf>,

        /// Directory used as the photo library for `import`
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Where to save the handed-off images (default: ~/Pictures/PhotoCapture)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: ~/.config/photo-capture/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Start on the front camera
        #[arg(long)]
        front: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=photo_capture=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => cli::list_cameras(),
        Commands::Session {
            max,
            script,
            source,
            library,
            output,
            config,
            front,
        } => cli::run_session(cli::SessionOptions {
            max_count: max,
            script,
            source,
            library,
            output,
            config,
            front,
        }),
    }
}
