// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Candidates for sources with both video and audio tracks, best first
pub const AUDIO_VIDEO_CANDIDATES: &[&str] = &[
    r#"video/webm;codecs="vp9,opus""#,
    r#"video/webm;codecs="vp8,opus""#,
    "video/webm",
];

/// Candidates for video-only sources, best first
pub const VIDEO_CANDIDATES: &[&str] = &[
    r#"video/webm;codecs="vp9""#,
    r#"video/webm;codecs="vp8""#,
    "video/webm",
];

/// Candidates for audio-only sources, best first
pub const AUDIO_CANDIDATES: &[&str] = &[r#"audio/webm;codecs="opus""#, "audio/webm"];

/// Recorder option keys understood by the native host
pub mod option_keys {
    pub const MIME_TYPE: &str = "mimeType";
    pub const VIDEO_BITS_PER_SECOND: &str = "videoBitsPerSecond";
    pub const AUDIO_BITS_PER_SECOND: &str = "audioBitsPerSecond";
    pub const BITS_PER_SECOND: &str = "bitsPerSecond";
}

/// Default video bitrate when no option is given (2.5 Mbps)
pub const DEFAULT_VIDEO_BPS: u64 = 2_500_000;

/// Default and maximum share of `bitsPerSecond` given to audio (128 kbps)
pub const DEFAULT_AUDIO_BPS: u64 = 128_000;

/// Default capture geometry for video inputs
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_FRAMERATE: u32 = 30;

/// Default server listen address
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Default TLS certificate and key locations (relative to the working directory)
pub const DEFAULT_TLS_CERT: &str = "certs/cert.pem";
pub const DEFAULT_TLS_KEY: &str = "certs/key.pem";

/// Directory served as static files
pub const DEFAULT_PUBLIC_DIR: &str = "public";

/// Directory uploads are written to
pub const DEFAULT_RECORDINGS_DIR: &str = "public/recordings";

/// Upload size limit (2 GiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

/// Extension of saved recordings
pub const RECORDING_EXTENSION: &str = "webm";

/// Matroska default TimecodeScale (1 ms in nanoseconds)
pub const DEFAULT_TIMECODE_SCALE: u64 = 1_000_000;
