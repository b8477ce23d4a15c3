// SPDX-License-Identifier: MPL-2.0

//! Codec and container naming for encoding identifiers

pub mod codec;

pub use codec::Codec;
