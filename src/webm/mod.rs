// SPDX-License-Identifier: MPL-2.0

//! WebM container handling
//!
//! - [`ebml`]: Variable-length integers and element headers
//! - [`ids`]: Element IDs
//! - [`document`]: Segment/Info/Cluster model that tolerates live output
//! - [`duration`]: Duration recovery for recordings uploaded without one

pub mod document;
pub mod duration;
pub mod ebml;
pub mod ids;

pub use document::{Cluster, Info, WebmDocument};
pub use duration::{FixedRecording, fix_duration, stream_duration};
