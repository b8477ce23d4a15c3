// SPDX-License-Identifier: MPL-2.0

//! Capture inputs for the GStreamer host

use ::gstreamer as gst;
use tracing::info;

use crate::constants::{DEFAULT_FRAMERATE, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::errors::RecordingError;
use crate::media::MediaSource;

/// Where an input reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDevice {
    /// PipeWire node; `None` uses the default device
    PipeWire(Option<String>),
    /// Generated test pattern or tone
    Test,
}

impl InputDevice {
    /// Parse a device argument: "test" selects the generator, "default" or
    /// an empty string the default PipeWire node, anything else a node
    /// serial or name
    pub fn from_arg(arg: &str) -> Self {
        match arg.trim() {
            "test" => Self::Test,
            "" | "default" => Self::PipeWire(None),
            target => Self::PipeWire(Some(target.to_string())),
        }
    }
}

/// Video capture input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInput {
    pub device: InputDevice,
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
}

impl VideoInput {
    pub fn new(device: InputDevice) -> Self {
        Self {
            device,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            framerate: DEFAULT_FRAMERATE,
        }
    }

    pub(crate) fn create_element(&self) -> Result<gst::Element, RecordingError> {
        match &self.device {
            InputDevice::Test => gst::ElementFactory::make("videotestsrc")
                .property("is-live", true)
                .build()
                .map_err(|e| RecordingError::Pipeline(format!("Failed to create videotestsrc: {}", e))),
            InputDevice::PipeWire(target) => pipewire_source(target.as_deref(), "video"),
        }
    }
}

/// Audio capture input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInput {
    pub device: InputDevice,
}

impl AudioInput {
    pub fn new(device: InputDevice) -> Self {
        Self { device }
    }

    pub(crate) fn create_element(&self) -> Result<gst::Element, RecordingError> {
        match &self.device {
            InputDevice::Test => gst::ElementFactory::make("audiotestsrc")
                .property("is-live", true)
                .build()
                .map_err(|e| RecordingError::Pipeline(format!("Failed to create audiotestsrc: {}", e))),
            InputDevice::PipeWire(target) => pipewire_source(target.as_deref(), "audio"),
        }
    }
}

/// A capture source with at most one video and one audio input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSource {
    pub video: Option<VideoInput>,
    pub audio: Option<AudioInput>,
}

impl CaptureSource {
    pub fn new(video: Option<VideoInput>, audio: Option<AudioInput>) -> Self {
        Self { video, audio }
    }
}

impl MediaSource for CaptureSource {
    fn video_track_count(&self) -> usize {
        usize::from(self.video.is_some())
    }

    fn audio_track_count(&self) -> usize {
        usize::from(self.audio.is_some())
    }
}

/// pipewiresrc, targeting a node serial/name when given
fn pipewire_source(target: Option<&str>, kind: &str) -> Result<gst::Element, RecordingError> {
    let mut builder = gst::ElementFactory::make("pipewiresrc").property("do-timestamp", true);

    match target {
        Some(target) => {
            let target = target.strip_prefix("pipewire-serial-").unwrap_or(target);
            info!(kind, target, "Using PipeWire target-object");
            builder = builder.property("target-object", target);
        }
        None => info!(kind, "Using default PipeWire source"),
    }

    builder
        .build()
        .map_err(|e| RecordingError::Pipeline(format!("Failed to create {} pipewiresrc: {}", kind, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_from_arg() {
        assert_eq!(InputDevice::from_arg("test"), InputDevice::Test);
        assert_eq!(InputDevice::from_arg("default"), InputDevice::PipeWire(None));
        assert_eq!(
            InputDevice::from_arg("pipewire-serial-42"),
            InputDevice::PipeWire(Some("pipewire-serial-42".to_string()))
        );
    }

    #[test]
    fn test_capture_source_counts() {
        let source = CaptureSource::new(Some(VideoInput::new(InputDevice::Test)), None);
        assert_eq!(source.video_track_count(), 1);
        assert_eq!(source.audio_track_count(), 0);
        assert!(CaptureSource::default().composition().is_empty());
    }
}
