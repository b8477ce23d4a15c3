// SPDX-License-Identifier: MPL-2.0

//! Duration fix-up for live-recorded WebM
//!
//! Browser recorders never know the final length while streaming, so their
//! output has no Duration and players show it as unseekable. The duration is
//! recovered from block timing and written into Segment Info.

use std::time::Duration;

use tracing::info;

use super::document::WebmDocument;
use crate::errors::WebmError;

/// Result of rewriting a recording
#[derive(Debug, Clone)]
pub struct FixedRecording {
    /// Rewritten WebM bytes
    pub bytes: Vec<u8>,
    /// Duration in timecode units, as written to Info
    pub duration: f64,
    /// Nanoseconds per timecode unit
    pub timecode_scale: u64,
    /// Whether the input was cut off
    pub truncated: bool,
}

impl FixedRecording {
    /// Duration as wall-clock time
    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos((self.duration * self.timecode_scale as f64) as u64)
    }
}

/// Stream duration in timecode units
///
/// Measured from the first block of the first cluster to the last block of
/// the last cluster. Negative spans (out of order timecodes) clamp to zero.
/// Block times outside the signed timecode range are rejected.
pub fn stream_duration(doc: &WebmDocument) -> Result<f64, WebmError> {
    if doc.clusters().next().is_none() {
        return Err(WebmError::NoClusters);
    }

    let mut first = None;
    let mut last = None;
    for cluster in doc.clusters() {
        if first.is_none() {
            first = cluster.first_block_time()?;
        }
        if let Some(time) = cluster.last_block_time()? {
            last = Some(time);
        }
    }

    match (first, last) {
        (Some(first), Some(last)) => Ok(last.saturating_sub(first).max(0) as f64),
        _ => Err(WebmError::NoBlocks),
    }
}

/// Parse `input`, write the measured duration into Info and re-serialize
pub fn fix_duration(input: &[u8]) -> Result<FixedRecording, WebmError> {
    let mut doc = WebmDocument::parse(input)?;
    let duration = stream_duration(&doc)?;

    let info = doc.info_mut().ok_or(WebmError::MissingSegment)?;
    let timecode_scale = info.timecode_scale()?;
    info.set_duration(duration)?;

    let bytes = doc.to_bytes()?;

    info!(
        duration,
        timecode_scale,
        blocks = doc.block_count(),
        truncated = doc.truncated(),
        "Fixed WebM duration"
    );

    Ok(FixedRecording {
        bytes,
        duration,
        timecode_scale,
        truncated: doc.truncated(),
    })
}
