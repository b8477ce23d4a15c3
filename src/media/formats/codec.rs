// SPDX-License-Identifier: GPL-3.0-only

//! Codec names used in WebM encoding identifiers

use std::fmt;

/// Codec named in the `codecs` parameter of an encoding identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Codec {
    /// VP8 video
    VP8,
    /// VP9 video
    VP9,
    /// Opus audio
    Opus,
    /// Any codec this crate has no encoder mapping for
    Other(String),
}

impl Codec {
    /// Parse a codec name as written in a `codecs` parameter (case-insensitive)
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "vp8" | "vp8.0" => Self::VP8,
            // Short and full-string forms, e.g. "vp09.00.10.08"
            "vp9" | "vp9.0" => Self::VP9,
            s if s.starts_with("vp09.") => Self::VP9,
            "opus" => Self::Opus,
            other => Self::Other(other.to_string()),
        }
    }

    /// Canonical lowercase name
    pub fn name(&self) -> &str {
        match self {
            Self::VP8 => "vp8",
            Self::VP9 => "vp9",
            Self::Opus => "opus",
            Self::Other(name) => name,
        }
    }

    /// Whether this is a video codec
    pub fn is_video(&self) -> bool {
        matches!(self, Self::VP8 | Self::VP9)
    }

    /// Whether this is an audio codec
    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Opus)
    }

    /// GStreamer encoder element for this codec, if known
    pub fn encoder_element(&self) -> Option<&'static str> {
        match self {
            Self::VP8 => Some("vp8enc"),
            Self::VP9 => Some("vp9enc"),
            Self::Opus => Some("opusenc"),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
