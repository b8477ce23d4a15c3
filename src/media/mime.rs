// SPDX-License-Identifier: MPL-2.0

//! Encoding identifier selection
//!
//! Picks the identifier (mime type plus codecs) a recorder should be
//! configured with, based on which kinds of tracks a source carries:
//! - Audio and video: VP9+Opus > VP8+Opus > plain `video/webm`
//! - Video only: VP9 > VP8 > plain `video/webm`
//! - Audio only: Opus > plain `audio/webm`
//!
//! Support is decided by a [`CapabilityProbe`] supplied by the host, so the
//! selection itself has no platform dependency.

use std::fmt;

use tracing::{debug, info};

use super::formats::Codec;
use crate::constants::{AUDIO_CANDIDATES, AUDIO_VIDEO_CANDIDATES, VIDEO_CANDIDATES};
use crate::errors::RecordingError;

/// Host capability check for encoding identifiers
pub trait CapabilityProbe {
    /// Whether the host can record with the given identifier
    fn is_type_supported(&self, mime_type: &str) -> bool;
}

impl<F> CapabilityProbe for F
where
    F: Fn(&str) -> bool,
{
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self(mime_type)
    }
}

/// Which kinds of tracks a media source carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackComposition {
    pub has_video: bool,
    pub has_audio: bool,
}

impl TrackComposition {
    /// Composition from track counts
    pub fn from_counts(video_tracks: usize, audio_tracks: usize) -> Self {
        Self {
            has_video: video_tracks > 0,
            has_audio: audio_tracks > 0,
        }
    }

    /// Whether the source has nothing to record
    pub fn is_empty(&self) -> bool {
        !self.has_video && !self.has_audio
    }
}

impl fmt::Display for TrackComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.has_video, self.has_audio) {
            (true, true) => f.write_str("audio+video"),
            (true, false) => f.write_str("video"),
            (false, true) => f.write_str("audio"),
            (false, false) => f.write_str("empty"),
        }
    }
}

/// Ordered candidate identifiers for a composition, best first
///
/// A composition without any tracks has no candidates and yields
/// [`RecordingError::NoTracks`].
pub fn candidates(composition: TrackComposition) -> Result<&'static [&'static str], RecordingError> {
    match (composition.has_video, composition.has_audio) {
        (true, true) => Ok(AUDIO_VIDEO_CANDIDATES),
        (true, false) => Ok(VIDEO_CANDIDATES),
        (false, true) => Ok(AUDIO_CANDIDATES),
        (false, false) => Err(RecordingError::NoTracks),
    }
}

/// Select the first candidate identifier the host supports
///
/// Candidates are probed in priority order and probing stops at the first
/// supported one.
///
/// # Returns
/// * `Ok(&str)` - The selected identifier
/// * `Err(RecordingError::NoTracks)` - The source has no tracks
/// * `Err(RecordingError::UnsupportedMimeType)` - No candidate is supported
pub fn select_mime_type<P>(
    composition: TrackComposition,
    probe: &P,
) -> Result<&'static str, RecordingError>
where
    P: CapabilityProbe + ?Sized,
{
    let candidates = candidates(composition)?;

    match candidates
        .iter()
        .copied()
        .find(|c| probe.is_type_supported(c))
    {
        Some(mime_type) => {
            info!(%composition, mime_type, "Selected recording mime type");
            Ok(mime_type)
        }
        None => {
            debug!(%composition, ?candidates, "No candidate mime type supported");
            Err(RecordingError::UnsupportedMimeType {
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            })
        }
    }
}

/// Top-level media type of an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// A parsed encoding identifier such as `video/webm;codecs="vp9,opus"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    pub kind: MediaKind,
    /// Container subtype, lowercase (e.g. "webm")
    pub container: String,
    /// Codecs listed in the `codecs` parameter, in order
    pub codecs: Vec<Codec>,
}

impl MimeType {
    /// Parse an identifier
    ///
    /// Accepts `type/subtype` optionally followed by parameters; only the
    /// `codecs` parameter is interpreted and its value may be quoted.
    /// Returns `None` for anything that is not `video/*` or `audio/*`.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split(';');
        let essence = parts.next()?.trim().to_ascii_lowercase();
        let (kind, container) = essence.split_once('/')?;

        let kind = match kind.trim() {
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            _ => return None,
        };

        let container = container.trim();
        if container.is_empty() {
            return None;
        }

        let mut codecs = Vec::new();
        for param in parts {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };
            if !name.trim().eq_ignore_ascii_case("codecs") {
                continue;
            }
            let value = value.trim().trim_matches('"');
            codecs.extend(
                value
                    .split(',')
                    .filter(|c| !c.trim().is_empty())
                    .map(Codec::from_name),
            );
        }

        Some(Self {
            kind,
            container: container.to_string(),
            codecs,
        })
    }

    /// Explicit video codec, if listed
    pub fn video_codec(&self) -> Option<&Codec> {
        self.codecs.iter().find(|c| c.is_video())
    }

    /// Explicit audio codec, if listed
    pub fn audio_codec(&self) -> Option<&Codec> {
        self.codecs.iter().find(|c| c.is_audio())
    }

    /// Whether any listed codec is unknown
    pub fn has_unknown_codec(&self) -> bool {
        self.codecs.iter().any(|c| matches!(c, Codec::Other(_)))
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        };
        write!(f, "{}/{}", kind, self.container)?;
        if !self.codecs.is_empty() {
            let names: Vec<&str> = self.codecs.iter().map(|c| c.name()).collect();
            write!(f, ";codecs=\"{}\"", names.join(","))?;
        }
        Ok(())
    }
}
