// SPDX-License-Identifier: MPL-2.0

//! GStreamer element detection
//!
//! Maps encoding identifiers to the elements needed to produce them and
//! checks which of those the local GStreamer installation provides.

use ::gstreamer as gst;
use tracing::{debug, info};

use crate::constants::{AUDIO_CANDIDATES, AUDIO_VIDEO_CANDIDATES, VIDEO_CANDIDATES};
use crate::media::{Codec, MediaKind, MimeType};

/// WebM muxer element
pub const WEBM_MUXER: &str = "webmmux";

/// Encoders needed for an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingPlan {
    /// Video codec, when the identifier carries video
    pub video: Option<Codec>,
    /// Audio codec, when the identifier carries audio
    pub audio: Option<Codec>,
}

impl EncodingPlan {
    /// Work out the codecs for an identifier
    ///
    /// A bare `video/webm` means VP8 video with Opus audio and a bare
    /// `audio/webm` means Opus. When codecs are listed only those tracks are
    /// recorded. Non-webm containers and unknown codecs have no plan.
    pub fn for_mime_type(mime: &MimeType) -> Option<Self> {
        if mime.container != "webm" || mime.has_unknown_codec() {
            return None;
        }

        let plan = match (mime.kind, mime.codecs.is_empty()) {
            (MediaKind::Video, true) => Self {
                video: Some(Codec::VP8),
                audio: Some(Codec::Opus),
            },
            (MediaKind::Video, false) => Self {
                video: mime.video_codec().cloned(),
                audio: mime.audio_codec().cloned(),
            },
            (MediaKind::Audio, true) => Self {
                video: None,
                audio: Some(Codec::Opus),
            },
            (MediaKind::Audio, false) => {
                if mime.video_codec().is_some() {
                    return None;
                }
                Self {
                    video: None,
                    audio: mime.audio_codec().cloned(),
                }
            }
        };

        if plan.video.is_none() && plan.audio.is_none() {
            return None;
        }
        Some(plan)
    }

    /// Elements the pipeline needs: muxer first, then encoders
    pub fn elements(&self) -> Vec<&'static str> {
        let mut elements = vec![WEBM_MUXER];
        elements.extend(
            [&self.video, &self.audio]
                .into_iter()
                .flatten()
                .filter_map(|codec| codec.encoder_element()),
        );
        elements
    }
}

/// Elements needed to record with an identifier, if it can be mapped at all
pub fn elements_for(mime: &MimeType) -> Option<Vec<&'static str>> {
    EncodingPlan::for_mime_type(mime).map(|plan| plan.elements())
}

/// Check if a specific GStreamer element is available
pub fn is_element_available(element_name: &str) -> bool {
    gst::init().ok();
    gst::ElementFactory::find(element_name).is_some()
}

/// Whether the local GStreamer can record with an identifier
pub fn is_mime_type_supported(mime_type: &str) -> bool {
    let Some(elements) = MimeType::parse(mime_type).as_ref().and_then(elements_for) else {
        debug!(mime_type, "No element mapping");
        return false;
    };

    let missing: Vec<&str> = elements
        .into_iter()
        .filter(|element| !is_element_available(element))
        .collect();
    if !missing.is_empty() {
        debug!(mime_type, ?missing, "Missing GStreamer elements");
        return false;
    }
    true
}

/// Log the support of every candidate identifier (for debugging)
pub fn log_available_encoders() {
    info!("=== GStreamer WebM Support ===");

    for element in [WEBM_MUXER, "vp8enc", "vp9enc", "opusenc"] {
        let mark = if is_element_available(element) { "✓" } else { "✗" };
        info!("  {} {}", mark, element);
    }

    for candidate in AUDIO_VIDEO_CANDIDATES
        .iter()
        .chain(VIDEO_CANDIDATES)
        .chain(AUDIO_CANDIDATES)
    {
        info!(supported = is_mime_type_supported(candidate), "  {}", candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(mime: &str) -> Option<EncodingPlan> {
        EncodingPlan::for_mime_type(&MimeType::parse(mime).unwrap())
    }

    #[test]
    fn test_bare_containers_use_defaults() {
        assert_eq!(
            plan("video/webm"),
            Some(EncodingPlan {
                video: Some(Codec::VP8),
                audio: Some(Codec::Opus),
            })
        );
        assert_eq!(
            plan("audio/webm"),
            Some(EncodingPlan {
                video: None,
                audio: Some(Codec::Opus),
            })
        );
    }

    #[test]
    fn test_listed_codecs_limit_tracks() {
        let vp9 = plan(r#"video/webm;codecs="vp9""#).unwrap();
        assert_eq!(vp9.video, Some(Codec::VP9));
        assert_eq!(vp9.audio, None);
        assert_eq!(vp9.elements(), vec!["webmmux", "vp9enc"]);
    }

    #[test]
    fn test_elements_for_audio_video() {
        let mime = MimeType::parse(r#"video/webm;codecs="vp8,opus""#).unwrap();
        assert_eq!(
            elements_for(&mime),
            Some(vec!["webmmux", "vp8enc", "opusenc"])
        );
    }

    #[test]
    fn test_unmapped_identifiers() {
        assert_eq!(plan("video/mp4"), None);
        assert_eq!(plan(r#"video/webm;codecs="av1""#), None);
        assert_eq!(plan(r#"audio/webm;codecs="vp8""#), None);
        assert!(!is_mime_type_supported("not a mime type"));
    }
}
