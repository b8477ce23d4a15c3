// SPDX-License-Identifier: MPL-2.0

//! Synthetic WebM streams shaped like live recorder output

#![allow(dead_code)]

use webm_recorder::webm::ebml::{UNKNOWN_SIZE, float_payload, uint_payload, write_element, write_id};
use webm_recorder::webm::ids;

pub fn element(id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    write_element(&mut out, id, payload).unwrap();
    out
}

pub fn unknown_size(id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    write_id(&mut out, id);
    out.extend_from_slice(&UNKNOWN_SIZE);
    out.extend_from_slice(payload);
    out
}

pub fn ebml_header(doc_type: &str) -> Vec<u8> {
    element(ids::EBML, &element(ids::DOC_TYPE, doc_type.as_bytes()))
}

/// Info with TimecodeScale and, optionally, an existing Duration
pub fn info(timecode_scale: u64, duration: Option<f64>) -> Vec<u8> {
    let mut payload = element(ids::TIMECODE_SCALE, &uint_payload(timecode_scale));
    if let Some(duration) = duration {
        payload.extend(element(ids::DURATION, &float_payload(duration)));
    }
    element(ids::INFO, &payload)
}

pub fn tracks() -> Vec<u8> {
    // One empty TrackEntry
    element(ids::TRACKS, &element(0xAE, &[]))
}

/// SimpleBlock on track 1 with a two byte frame
pub fn simple_block(timecode: i16) -> Vec<u8> {
    let tc = timecode.to_be_bytes();
    element(ids::SIMPLE_BLOCK, &[0x81, tc[0], tc[1], 0x80, 0xAA, 0xBB])
}

/// BlockGroup wrapping a Block on track 1
pub fn block_group(timecode: i16) -> Vec<u8> {
    let tc = timecode.to_be_bytes();
    element(
        ids::BLOCK_GROUP,
        &element(ids::BLOCK, &[0x81, tc[0], tc[1], 0x00, 0xCC]),
    )
}

pub fn cluster_payload(timecode: u64, blocks: &[i16]) -> Vec<u8> {
    let mut payload = element(ids::TIMECODE, &uint_payload(timecode));
    for &block in blocks {
        payload.extend(simple_block(block));
    }
    payload
}

/// A stream the way browsers write it: unknown-size Segment and Clusters,
/// no Duration
pub fn live_stream(clusters: &[(u64, Vec<i16>)]) -> Vec<u8> {
    let mut segment = info(1_000_000, None);
    segment.extend(tracks());
    for (timecode, blocks) in clusters {
        segment.extend(unknown_size(ids::CLUSTER, &cluster_payload(*timecode, blocks)));
    }

    let mut out = ebml_header("webm");
    out.extend(unknown_size(ids::SEGMENT, &segment));
    out
}

/// Two clusters spanning 1500 ms
pub fn sample_recording() -> Vec<u8> {
    live_stream(&[(0, vec![0, 33, 66]), (1000, vec![0, 33, 500])])
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
