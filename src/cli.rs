// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the ingest server
//! - Fixing the duration of WebM files
//! - Inspecting identifier selection
//! - Recording through GStreamer

use std::path::{Path, PathBuf};

use clap::Args;
use webm_recorder::config::Config;
use webm_recorder::errors::AppResult;
use webm_recorder::media::mime::candidates;
use webm_recorder::recorder::{MIME_TYPE_KEY, RecorderOptions, build_options};
use webm_recorder::{MediaSource, TrackCounts, fix_duration, server};

/// Options for the `serve` command; flags override the config file
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080 or :8080
    #[arg(long)]
    pub addr: Option<String>,

    /// TLS certificate (PEM); pass "" to disable TLS
    #[arg(long)]
    pub tls_cert: Option<String>,

    /// TLS private key (PEM); pass "" to disable TLS
    #[arg(long)]
    pub tls_key: Option<String>,

    /// Directory served at /
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// Directory uploads are saved to
    #[arg(long)]
    pub recordings_dir: Option<PathBuf>,

    /// Directory uploads are spooled to while received
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Largest accepted upload in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl ServeArgs {
    /// Resolve the server configuration
    pub fn into_config(self) -> AppResult<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(addr) = self.addr {
            config.addr = addr;
        }
        // Plain strings so that an empty value gets through clap
        if let Some(cert) = self.tls_cert {
            config.tls_cert = Some(PathBuf::from(cert));
        }
        if let Some(key) = self.tls_key {
            config.tls_key = Some(PathBuf::from(key));
        }
        if let Some(dir) = self.public_dir {
            config.public_dir = dir;
        }
        if let Some(dir) = self.recordings_dir {
            config.recordings_dir = dir;
        }
        if let Some(dir) = self.temp_dir {
            config.temp_dir = dir;
        }
        if let Some(limit) = self.max_upload_bytes {
            config.max_upload_bytes = limit;
        }
        Ok(config)
    }
}

/// Run the ingest server until Ctrl+C
pub fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.into_config()?;

    match config.tls_paths() {
        Some((cert, _)) => println!("Serving {} (TLS certificate: {})", config.addr, cert.display()),
        None => println!("Serving {} (TLS disabled)", config.addr),
    }
    println!("Public directory: {}", config.public_dir.display());
    println!("Recordings: {}", config.recordings_dir.display());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::serve(config))?;
    Ok(())
}

/// Rewrite a WebM file with its duration filled in
pub fn fix_duration_file(
    input: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(input)?;
    let fixed = fix_duration(&bytes)?;

    let output_path = output.unwrap_or_else(|| default_fixed_path(input));
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, &fixed.bytes)?;

    let duration = fixed.as_duration();
    println!("Duration: {:.3}s", duration.as_secs_f64());
    if fixed.truncated {
        println!("Input was truncated; incomplete trailing data dropped");
    }
    println!("Saved: {}", output_path.display());
    Ok(())
}

fn default_fixed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    input.with_file_name(format!("{}.fixed.webm", stem))
}

/// Print the candidates for a composition, what the given host supports and
/// the resulting recorder options
pub fn select(
    video: bool,
    audio: bool,
    supported: &[String],
    mime_type: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = TrackCounts::new(usize::from(video), usize::from(audio));
    let probe = |mime: &str| supported.iter().any(|s| s == mime);

    let composition = source.composition();
    println!("Source: {}", composition);
    if let Ok(list) = candidates(composition) {
        println!("Candidates:");
        for &candidate in list {
            let mark = if probe(candidate) { "✓" } else { "✗" };
            println!("  {} {}", mark, candidate);
        }
    }

    let overrides = mime_type.map(|mime| RecorderOptions::new().with(MIME_TYPE_KEY, mime));
    let options = build_options(&source, &probe, overrides.as_ref())?;
    println!("Options: {}", serde_json::to_string(&options)?);
    Ok(())
}

/// Print GStreamer support for every candidate identifier
#[cfg(feature = "gstreamer")]
pub fn probe() -> Result<(), Box<dyn std::error::Error>> {
    use webm_recorder::CapabilityProbe;
    use webm_recorder::backends::gstreamer::{GstHost, elements_for, log_available_encoders};
    use webm_recorder::constants::{AUDIO_CANDIDATES, AUDIO_VIDEO_CANDIDATES, VIDEO_CANDIDATES};
    use webm_recorder::media::MimeType;

    let host = GstHost::new()?;
    log_available_encoders();

    println!("GStreamer support:");
    for candidate in AUDIO_VIDEO_CANDIDATES
        .iter()
        .chain(VIDEO_CANDIDATES)
        .chain(AUDIO_CANDIDATES)
    {
        let mark = if host.is_type_supported(candidate) { "✓" } else { "✗" };
        let elements = MimeType::parse(candidate)
            .as_ref()
            .and_then(elements_for)
            .map(|e| e.join(" + "))
            .unwrap_or_default();
        println!("  {} {:<28} {}", mark, candidate, elements);
    }
    Ok(())
}

/// Options for the `record` command
#[cfg(feature = "gstreamer")]
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Video device: PipeWire serial/node name, "default" or "test"
    #[arg(long)]
    pub video: Option<String>,

    /// Record a video test pattern
    #[arg(long, conflicts_with = "video")]
    pub video_test: bool,

    /// Audio device: PipeWire serial/node name, "default" or "test"
    #[arg(long)]
    pub audio: Option<String>,

    /// Record an audio test tone
    #[arg(long, conflicts_with = "audio")]
    pub audio_test: bool,

    /// Recording duration in seconds
    #[arg(short, long, default_value = "10")]
    pub duration: u64,

    /// Output file path (default: ~/Videos/webm-recorder/recording_TIMESTAMP.webm)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Caller-supplied mimeType, laid over the computed one
    #[arg(long)]
    pub mime_type: Option<String>,

    /// videoBitsPerSecond option
    #[arg(long)]
    pub video_bps: Option<u64>,

    /// audioBitsPerSecond option
    #[arg(long)]
    pub audio_bps: Option<u64>,
}

#[cfg(feature = "gstreamer")]
impl RecordArgs {
    fn source(&self) -> webm_recorder::backends::gstreamer::CaptureSource {
        use webm_recorder::backends::gstreamer::{AudioInput, CaptureSource, InputDevice, VideoInput};

        let video = if self.video_test {
            Some(VideoInput::new(InputDevice::Test))
        } else {
            self.video.as_deref().map(|arg| VideoInput::new(InputDevice::from_arg(arg)))
        };
        let audio = if self.audio_test {
            Some(AudioInput::new(InputDevice::Test))
        } else {
            self.audio.as_deref().map(|arg| AudioInput::new(InputDevice::from_arg(arg)))
        };
        CaptureSource::new(video, audio)
    }

    fn overrides(&self) -> Option<RecorderOptions> {
        use webm_recorder::constants::option_keys;

        let mut options = RecorderOptions::new();
        if let Some(mime) = &self.mime_type {
            options.insert(MIME_TYPE_KEY, mime.as_str());
        }
        if let Some(bps) = self.video_bps {
            options.insert(option_keys::VIDEO_BITS_PER_SECOND, bps);
        }
        if let Some(bps) = self.audio_bps {
            options.insert(option_keys::AUDIO_BITS_PER_SECOND, bps);
        }
        (!options.is_empty()).then_some(options)
    }
}

/// Record through the GStreamer host
#[cfg(feature = "gstreamer")]
pub fn record(args: RecordArgs) -> Result<(), Box<dyn std::error::Error>> {
    use chrono::Local;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};
    use webm_recorder::backends::gstreamer::GstHost;
    use webm_recorder::new_media_recorder;
    use webm_recorder::storage::default_video_dir;

    let host = GstHost::new()?;
    let source = args.source();
    let overrides = args.overrides();

    let mut recorder = new_media_recorder(&host, &source, overrides.as_ref())?;
    println!("Mime type: {}", recorder.mime_type());

    // Determine output path
    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => {
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            default_video_dir().join(format!("recording_{}.webm", timestamp))
        }
    };
    println!("Output: {}", output_path.display());
    println!("Duration: {} seconds", args.duration);

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!();
    println!("Recording... (press Ctrl+C to stop early)");
    recorder.start(&output_path)?;

    // Wait for duration or Ctrl+C
    let start = Instant::now();
    let target_duration = Duration::from_secs(args.duration);

    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        // Print progress
        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    let final_path = recorder.stop()?;
    println!("Recording saved: {}", final_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_flags_override_defaults() {
        let args = ServeArgs {
            addr: Some("127.0.0.1:9000".to_string()),
            tls_cert: Some(String::new()),
            ..Default::default()
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.addr, "127.0.0.1:9000");
        assert!(config.tls_paths().is_none());
        assert_eq!(config.public_dir, Config::default().public_dir);
    }

    #[test]
    fn test_default_fixed_path() {
        assert_eq!(
            default_fixed_path(Path::new("/tmp/call.webm")),
            PathBuf::from("/tmp/call.fixed.webm")
        );
    }
}
