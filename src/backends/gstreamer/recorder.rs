// SPDX-License-Identifier: MPL-2.0

//! WebM recording pipeline
//!
//! ```text
//! video: src → videoconvert → videoscale → videorate → caps → queue → vp8enc|vp9enc ┐
//!                                                                                   ├→ webmmux → filesink
//! audio: src → audioconvert → audioresample → queue → opusenc ──────────────────────┘
//! ```
//!
//! Branches for tracks the configured identifier does not cover are left out.

use std::path::{Path, PathBuf};

use ::gstreamer as gst;
use ::gstreamer::prelude::*;
use tracing::{debug, error, info, warn};

use super::settings::RecordingSettings;
use super::source::{AudioInput, CaptureSource, VideoInput};
use crate::errors::RecordingError;
use crate::media::Codec;

/// How long `stop` waits for the muxer to finish the file
const EOS_TIMEOUT_SECS: u64 = 5;

/// Bounds accepted by opusenc's `bitrate` property
const OPUS_MIN_BPS: u64 = 4_000;
const OPUS_MAX_BPS: u64 = 650_000;

/// A GStreamer WebM recorder
#[derive(Debug)]
pub struct GstRecorder {
    pipeline: gst::Pipeline,
    filesink: gst::Element,
    settings: RecordingSettings,
    file_path: Option<PathBuf>,
}

impl GstRecorder {
    /// Build the pipeline for `source`; nothing runs until [`GstRecorder::start`]
    pub fn new(source: &CaptureSource, settings: RecordingSettings) -> Result<Self, RecordingError> {
        gst::init().map_err(|e| RecordingError::Gstreamer(format!("Failed to initialize GStreamer: {}", e)))?;

        let video = match (&source.video, &settings.plan.video) {
            (Some(input), Some(codec)) => Some((input, codec)),
            _ => None,
        };
        let audio = match (&source.audio, &settings.plan.audio) {
            (Some(input), Some(codec)) => Some((input, codec)),
            _ => None,
        };
        if video.is_none() && audio.is_none() {
            return Err(RecordingError::NotSupported(format!(
                "{} covers none of the source tracks",
                settings.mime_type
            )));
        }
        if source.video.is_some() && video.is_none() {
            warn!(mime_type = %settings.mime_type, "Video track not covered, recording without it");
        }
        if source.audio.is_some() && audio.is_none() {
            warn!(mime_type = %settings.mime_type, "Audio track not covered, recording without it");
        }

        let pipeline = gst::Pipeline::new();
        let muxer = make("webmmux")?;
        let filesink = make("filesink")?;
        pipeline
            .add_many([&muxer, &filesink])
            .map_err(|e| RecordingError::Pipeline(format!("Failed to add muxer: {}", e)))?;
        link(&muxer, &filesink)?;

        if let Some((input, codec)) = video {
            Self::add_video_branch(&pipeline, &muxer, input, codec, settings.video_bps)?;
        }
        if let Some((input, codec)) = audio {
            Self::add_audio_branch(&pipeline, &muxer, input, codec, settings.audio_bps)?;
        }

        info!(
            mime_type = %settings.mime_type,
            video = ?settings.plan.video,
            audio = ?settings.plan.audio,
            "Recording pipeline created"
        );

        Ok(Self {
            pipeline,
            filesink,
            settings,
            file_path: None,
        })
    }

    fn add_video_branch(
        pipeline: &gst::Pipeline,
        muxer: &gst::Element,
        input: &VideoInput,
        codec: &Codec,
        bitrate: u64,
    ) -> Result<(), RecordingError> {
        let source = input.create_element()?;
        let caps = gst::Caps::builder("video/x-raw")
            .field("width", input.width as i32)
            .field("height", input.height as i32)
            .field("framerate", gst::Fraction::new(input.framerate as i32, 1))
            .build();
        let capsfilter = gst::ElementFactory::make("capsfilter")
            .property("caps", &caps)
            .build()
            .map_err(|e| RecordingError::Pipeline(format!("Failed to create capsfilter: {}", e)))?;

        let encoder = make(encoder_name(codec)?)?;
        // Realtime deadline; the default "best" cannot keep up with live input
        encoder.set_property_from_str("deadline", "1");
        encoder.set_property_from_str("target-bitrate", &bitrate.min(i32::MAX as u64).to_string());

        let chain = [
            source,
            make("videoconvert")?,
            make("videoscale")?,
            make("videorate")?,
            capsfilter,
            make("queue")?,
            encoder,
        ];
        add_chain(pipeline, &chain, muxer)?;
        debug!(codec = %codec, bitrate, "Video branch linked");
        Ok(())
    }

    fn add_audio_branch(
        pipeline: &gst::Pipeline,
        muxer: &gst::Element,
        input: &AudioInput,
        codec: &Codec,
        bitrate: u64,
    ) -> Result<(), RecordingError> {
        let encoder = make(encoder_name(codec)?)?;
        let bitrate = bitrate.clamp(OPUS_MIN_BPS, OPUS_MAX_BPS);
        encoder.set_property_from_str("bitrate", &bitrate.to_string());

        let chain = [
            input.create_element()?,
            make("audioconvert")?,
            make("audioresample")?,
            make("queue")?,
            encoder,
        ];
        add_chain(pipeline, &chain, muxer)?;
        debug!(codec = %codec, bitrate, "Audio branch linked");
        Ok(())
    }

    /// Identifier this recorder encodes
    pub fn mime_type(&self) -> &str {
        &self.settings.mime_type
    }

    /// Resolved encoder settings
    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    /// Start recording into `path`
    pub fn start(&mut self, path: &Path) -> Result<(), RecordingError> {
        let location = path
            .to_str()
            .ok_or_else(|| RecordingError::Pipeline(format!("Non UTF-8 output path: {}", path.display())))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RecordingError::Pipeline(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        info!(path = %path.display(), "Starting recording");
        self.filesink.set_property("location", location);
        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| RecordingError::Pipeline(format!("Failed to start recording: {}", e)))?;
        self.file_path = Some(path.to_path_buf());

        // Check for immediate errors
        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| RecordingError::Pipeline("No bus available".to_string()))?;
        if let Some(msg) = bus.timed_pop_filtered(
            gst::ClockTime::from_mseconds(500),
            &[gst::MessageType::Error, gst::MessageType::Warning],
        ) {
            match msg.view() {
                gst::MessageView::Error(err) => {
                    error!(
                        error = %err.error(),
                        debug = ?err.debug(),
                        source = ?err.src().map(|s| s.name()),
                        "GStreamer error during start"
                    );
                    let _ = self.pipeline.set_state(gst::State::Null);
                    return Err(RecordingError::Pipeline(format!(
                        "Recording start error: {}",
                        err.error()
                    )));
                }
                gst::MessageView::Warning(w) => {
                    warn!(
                        warning = %w.error(),
                        debug = ?w.debug(),
                        source = ?w.src().map(|s| s.name()),
                        "GStreamer warning during start"
                    );
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Stop recording and finalize the file
    ///
    /// Waits up to a few seconds for the muxer to flush before tearing the
    /// pipeline down.
    pub fn stop(&mut self) -> Result<PathBuf, RecordingError> {
        let path = self
            .file_path
            .take()
            .ok_or_else(|| RecordingError::Pipeline("Recorder was not started".to_string()))?;

        info!("Sending EOS to pipeline");
        if !self.pipeline.send_event(gst::event::Eos::new()) {
            warn!("Failed to send EOS event to pipeline");
        }

        let mut result = Ok(());
        if let Some(bus) = self.pipeline.bus() {
            match bus.timed_pop_filtered(
                gst::ClockTime::from_seconds(EOS_TIMEOUT_SECS),
                &[gst::MessageType::Eos, gst::MessageType::Error],
            ) {
                Some(msg) => {
                    if let gst::MessageView::Error(err) = msg.view() {
                        error!(error = %err.error(), debug = ?err.debug(), "GStreamer error while finishing");
                        result = Err(RecordingError::Pipeline(format!(
                            "Recording finish error: {}",
                            err.error()
                        )));
                    }
                }
                None => warn!(timeout_secs = EOS_TIMEOUT_SECS, "Timed out waiting for EOS"),
            }
        }

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| RecordingError::Pipeline(format!("Failed to stop pipeline: {}", e)))?;
        result?;

        info!(path = %path.display(), "Recording saved");
        Ok(path)
    }
}

impl Drop for GstRecorder {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

fn make(factory: &str) -> Result<gst::Element, RecordingError> {
    gst::ElementFactory::make(factory)
        .build()
        .map_err(|e| RecordingError::Pipeline(format!("Failed to create {}: {}", factory, e)))
}

fn encoder_name(codec: &Codec) -> Result<&'static str, RecordingError> {
    codec
        .encoder_element()
        .ok_or_else(|| RecordingError::NotSupported(codec.to_string()))
}

fn link(src: &gst::Element, sink: &gst::Element) -> Result<(), RecordingError> {
    src.link(sink).map_err(|_| {
        RecordingError::Pipeline(format!("Failed to link {} to {}", src.name(), sink.name()))
    })
}

/// Add `chain` to the pipeline, link it in order and into `muxer`
fn add_chain(
    pipeline: &gst::Pipeline,
    chain: &[gst::Element],
    muxer: &gst::Element,
) -> Result<(), RecordingError> {
    pipeline
        .add_many(chain)
        .map_err(|e| RecordingError::Pipeline(format!("Failed to add elements to pipeline: {}", e)))?;
    gst::Element::link_many(chain)
        .map_err(|e| RecordingError::Pipeline(format!("Failed to link branch: {}", e)))?;
    if let Some(last) = chain.last() {
        link(last, muxer)?;
    }
    Ok(())
}
