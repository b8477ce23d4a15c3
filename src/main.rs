// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "webm-recorder")]
#[command(about = "Record WebM locally or receive browser recordings over HTTP")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the public directory and accept uploads at /record/<name>
    Serve(cli::ServeArgs),

    /// Rewrite a WebM file with its duration filled in
    FixDuration {
        /// Recording to fix
        input: PathBuf,

        /// Output file path (default: INPUT with a ".fixed.webm" suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which encoding identifier a source would be recorded with
    Select {
        /// The source has a video track
        #[arg(long)]
        video: bool,

        /// The source has an audio track
        #[arg(long)]
        audio: bool,

        /// Identifier the host supports (repeatable)
        #[arg(long = "supported", value_name = "TYPE")]
        supported: Vec<String>,

        /// Caller-supplied mimeType, laid over the computed one
        #[arg(long)]
        mime_type: Option<String>,
    },

    /// Show which identifiers the local GStreamer can record
    #[cfg(feature = "gstreamer")]
    Probe,

    /// Record from PipeWire devices or test sources
    #[cfg(feature = "gstreamer")]
    Record(cli::RecordArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=webm_recorder=debug, RUST_LOG=info
    let default_level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(true)
        .with_level(true)
        .init();

    match cli.command {
        Commands::Serve(args) => cli::serve(args),
        Commands::FixDuration { input, output } => cli::fix_duration_file(&input, output),
        Commands::Select {
            video,
            audio,
            supported,
            mime_type,
        } => cli::select(video, audio, &supported, mime_type),
        #[cfg(feature = "gstreamer")]
        Commands::Probe => cli::probe(),
        #[cfg(feature = "gstreamer")]
        Commands::Record(args) => cli::record(args),
    }
}
