// SPDX-License-Identifier: MPL-2.0

//! Media source description and encoding identifier selection
//!
//! # Modules
//!
//! - [`formats`]: Codec names used in encoding identifiers
//! - [`mime`]: Identifier parsing and "first supported wins" selection
//! - [`source`]: The media source handle the recorder factory reads

pub mod formats;
pub mod mime;
pub mod source;

// Re-export commonly used types
pub use formats::Codec;
pub use mime::{CapabilityProbe, MediaKind, MimeType, TrackComposition, select_mime_type};
pub use source::{MediaSource, TrackCounts};
