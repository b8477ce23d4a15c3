// SPDX-License-Identifier: MPL-2.0

//! Recorder options resolved into encoder settings

use serde_json::Value;
use tracing::debug;

use super::detection::EncodingPlan;
use crate::constants::{DEFAULT_AUDIO_BPS, DEFAULT_VIDEO_BPS, option_keys};
use crate::errors::RecordingError;
use crate::media::MimeType;
use crate::recorder::RecorderOptions;

/// Everything the pipeline needs from a recorder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSettings {
    /// Identifier the recorder was configured with
    pub mime_type: String,
    /// Codecs to encode with
    pub plan: EncodingPlan,
    /// Video target bitrate in bits per second
    pub video_bps: u64,
    /// Audio target bitrate in bits per second
    pub audio_bps: u64,
}

impl RecordingSettings {
    /// Validate recorder options and resolve bitrates
    ///
    /// Unknown keys are ignored. `bitsPerSecond` is shared between the
    /// tracks: audio gets up to 128 kbps (at most half the total) and video
    /// the rest, unless the per-track keys are also given.
    pub fn from_options(options: &RecorderOptions) -> Result<Self, RecordingError> {
        let mime_type = match options.get(option_keys::MIME_TYPE) {
            Some(Value::String(mime)) => mime.clone(),
            Some(_) => {
                return Err(RecordingError::invalid_option(
                    option_keys::MIME_TYPE,
                    "must be a string",
                ));
            }
            None => return Err(RecordingError::invalid_option(option_keys::MIME_TYPE, "missing")),
        };

        let plan = MimeType::parse(&mime_type)
            .as_ref()
            .and_then(EncodingPlan::for_mime_type)
            .ok_or_else(|| RecordingError::NotSupported(mime_type.clone()))?;

        let total = bitrate(options, option_keys::BITS_PER_SECOND)?;
        let (shared_video, shared_audio) = match total {
            Some(total) => {
                let audio = DEFAULT_AUDIO_BPS.min(total / 2).max(1);
                (total.saturating_sub(audio).max(1), audio)
            }
            None => (DEFAULT_VIDEO_BPS, DEFAULT_AUDIO_BPS),
        };

        let video_bps = bitrate(options, option_keys::VIDEO_BITS_PER_SECOND)?.unwrap_or(shared_video);
        let audio_bps = bitrate(options, option_keys::AUDIO_BITS_PER_SECOND)?.unwrap_or(shared_audio);

        debug!(mime_type, video_bps, audio_bps, ?plan, "Resolved recorder settings");

        Ok(Self {
            mime_type,
            plan,
            video_bps,
            audio_bps,
        })
    }
}

/// A positive integer bitrate option, if present
fn bitrate(options: &RecorderOptions, key: &str) -> Result<Option<u64>, RecordingError> {
    match options.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|bps| *bps > 0)
            .map(Some)
            .ok_or_else(|| RecordingError::invalid_option(key, "must be a positive integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Codec;

    fn options(mime: &str) -> RecorderOptions {
        RecorderOptions::new().with("mimeType", mime)
    }

    #[test]
    fn test_defaults() {
        let settings = RecordingSettings::from_options(&options("video/webm")).unwrap();
        assert_eq!(settings.video_bps, DEFAULT_VIDEO_BPS);
        assert_eq!(settings.audio_bps, DEFAULT_AUDIO_BPS);
        assert_eq!(settings.plan.video, Some(Codec::VP8));
    }

    #[test]
    fn test_bits_per_second_split() {
        let settings = RecordingSettings::from_options(
            &options("video/webm").with("bitsPerSecond", 1_000_000),
        )
        .unwrap();
        assert_eq!(settings.audio_bps, 128_000);
        assert_eq!(settings.video_bps, 872_000);

        let small =
            RecordingSettings::from_options(&options("video/webm").with("bitsPerSecond", 100_000))
                .unwrap();
        assert_eq!(small.audio_bps, 50_000);
        assert_eq!(small.video_bps, 50_000);
    }

    #[test]
    fn test_specific_keys_win() {
        let settings = RecordingSettings::from_options(
            &options("video/webm")
                .with("bitsPerSecond", 1_000_000)
                .with("videoBitsPerSecond", 3_000_000),
        )
        .unwrap();
        assert_eq!(settings.video_bps, 3_000_000);
        assert_eq!(settings.audio_bps, 128_000);
    }

    #[test]
    fn test_invalid_values() {
        let err = RecordingSettings::from_options(&options("video/webm").with("videoBitsPerSecond", -5))
            .unwrap_err();
        assert_eq!(
            err,
            RecordingError::invalid_option("videoBitsPerSecond", "must be a positive integer")
        );

        let err = RecordingSettings::from_options(&RecorderOptions::new().with("mimeType", 3))
            .unwrap_err();
        assert!(matches!(err, RecordingError::InvalidOption { .. }));
    }

    #[test]
    fn test_unmapped_mime_type() {
        let err = RecordingSettings::from_options(&options("video/mp4")).unwrap_err();
        assert_eq!(err, RecordingError::NotSupported("video/mp4".to_string()));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let settings =
            RecordingSettings::from_options(&options("audio/webm").with("audioBitrateMode", "cbr"))
                .unwrap();
        assert_eq!(settings.plan.video, None);
    }
}
