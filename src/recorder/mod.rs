// SPDX-License-Identifier: MPL-2.0

//! Recorder factory
//!
//! [`new_media_recorder`] picks an encoding identifier for a source, merges
//! it with caller options and hands both to the host's native recorder. The
//! host does all capture, encoding and muxing; this module only configures it.

pub mod options;

pub use options::{MIME_TYPE_KEY, RecorderOptions, build_options};

use tracing::debug;

use crate::errors::RecordingError;
use crate::media::{CapabilityProbe, MediaSource};

/// A platform facility that records media sources
///
/// The host is also the capability probe consulted during selection.
pub trait RecorderHost: CapabilityProbe {
    /// Source handle the host records from
    type Source: MediaSource + ?Sized;
    /// Recorder handle returned by [`RecorderHost::construct`]
    type Recorder;
    /// Host construction error; selection errors convert into it
    type Error: From<RecordingError>;

    /// Construct a native recorder for `source` configured with `options`
    fn construct(
        &self,
        source: &Self::Source,
        options: RecorderOptions,
    ) -> Result<Self::Recorder, Self::Error>;
}

/// Create a recorder for `source`, configured with the best supported
/// identifier and any caller overrides
///
/// # Returns
/// * `Ok(H::Recorder)` - Recorder handle from the host
/// * `Err(H::Error)` - Selection error, or the host's construction error unchanged
pub fn new_media_recorder<H>(
    host: &H,
    source: &H::Source,
    overrides: Option<&RecorderOptions>,
) -> Result<H::Recorder, H::Error>
where
    H: RecorderHost,
{
    let options = build_options(source, host, overrides)?;
    debug!(options = ?options, "Constructing recorder");
    host.construct(source, options)
}
