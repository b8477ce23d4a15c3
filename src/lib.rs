// SPDX-License-Identifier: MPL-2.0

//! WebM Recorder - recorder configuration, a GStreamer recording host and a
//! browser recording ingest server
//!
//! # Architecture
//!
//! - [`media`]: Track composition, encoding identifiers and candidate selection
//! - [`recorder`]: Recorder options and the [`new_media_recorder`] factory
//! - [`backends`]: Native recorder hosts (GStreamer)
//! - [`webm`]: EBML parsing and duration fix-up of live WebM output
//! - [`server`]: HTTP server receiving browser recordings
//! - [`config`]: Server configuration
//! - [`storage`]: Recording paths and file output
//!
//! # Example
//!
//! ```
//! use webm_recorder::{RecorderOptions, TrackCounts, build_options};
//!
//! let supported = |mime: &str| mime == "video/webm";
//! let options = build_options(&TrackCounts::new(1, 1), &supported, None).unwrap();
//! assert_eq!(options.mime_type(), Some("video/webm"));
//!
//! let overrides = RecorderOptions::new().with("mimeType", "custom");
//! let options = build_options(&TrackCounts::new(1, 1), &supported, Some(&overrides)).unwrap();
//! assert_eq!(options.mime_type(), Some("custom"));
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod recorder;
pub mod server;
pub mod storage;
pub mod webm;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, RecordingError, WebmError};
pub use media::{CapabilityProbe, MediaSource, MimeType, TrackComposition, TrackCounts, select_mime_type};
pub use recorder::{RecorderHost, RecorderOptions, build_options, new_media_recorder};
pub use webm::fix_duration;
