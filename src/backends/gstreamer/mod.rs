// SPDX-License-Identifier: MPL-2.0

//! GStreamer recorder host
//!
//! Plays the part a browser's native `MediaRecorder` plays: it answers
//! capability probes and builds recorders from a source and an options
//! mapping.
//!
//! - [`detection`]: Identifier → element mapping and availability checks
//! - [`source`]: PipeWire and test-pattern capture inputs
//! - [`settings`]: Option validation and bitrate resolution
//! - [`recorder`]: The WebM recording pipeline

pub mod detection;
pub mod recorder;
pub mod settings;
pub mod source;

pub use detection::{
    EncodingPlan, elements_for, is_element_available, is_mime_type_supported,
    log_available_encoders,
};
pub use recorder::GstRecorder;
pub use settings::RecordingSettings;
pub use source::{AudioInput, CaptureSource, InputDevice, VideoInput};

use ::gstreamer as gst;
use tracing::debug;

use crate::errors::RecordingError;
use crate::media::CapabilityProbe;
use crate::recorder::{RecorderHost, RecorderOptions};

/// Recorder host backed by the local GStreamer installation
#[derive(Debug, Clone, Copy, Default)]
pub struct GstHost;

impl GstHost {
    /// Initialize GStreamer and create the host
    pub fn new() -> Result<Self, RecordingError> {
        gst::init().map_err(|e| RecordingError::Gstreamer(format!("Failed to initialize GStreamer: {}", e)))?;
        Ok(Self)
    }
}

impl CapabilityProbe for GstHost {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        is_mime_type_supported(mime_type)
    }
}

impl RecorderHost for GstHost {
    type Source = CaptureSource;
    type Recorder = GstRecorder;
    type Error = RecordingError;

    fn construct(
        &self,
        source: &CaptureSource,
        options: RecorderOptions,
    ) -> Result<GstRecorder, RecordingError> {
        let settings = RecordingSettings::from_options(&options)?;
        if !self.is_type_supported(&settings.mime_type) {
            debug!(mime_type = %settings.mime_type, "Configured mime type rejected");
            return Err(RecordingError::NotSupported(settings.mime_type));
        }
        GstRecorder::new(source, settings)
    }
}
