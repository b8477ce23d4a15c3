// SPDX-License-Identifier: MPL-2.0

//! Native recorder hosts
//!
//! A host answers "can you record this identifier?" and constructs recorders
//! from a source and an options mapping (see [`crate::recorder::RecorderHost`]).
//!
//! - [`gstreamer`]: GStreamer pipelines (vp8enc/vp9enc/opusenc + webmmux)

#[cfg(feature = "gstreamer")]
pub mod gstreamer;
