// SPDX-License-Identifier: MPL-2.0

//! Integration tests for WebM duration fix-up

mod common;

use common::*;
use std::time::Duration;
use webm_recorder::WebmError;
use webm_recorder::webm::ebml::UNKNOWN_SIZE;
use webm_recorder::webm::{WebmDocument, fix_duration, ids};

fn segment(children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = ebml_header("webm");
    out.extend(unknown_size(ids::SEGMENT, &children.concat()));
    out
}

#[test]
fn test_live_stream_gets_duration() {
    let fixed = fix_duration(&sample_recording()).unwrap();

    assert_eq!(fixed.duration, 1500.0);
    assert_eq!(fixed.timecode_scale, 1_000_000);
    assert!(!fixed.truncated);
    assert_eq!(fixed.as_duration(), Duration::from_millis(1500));

    let doc = WebmDocument::parse(&fixed.bytes).unwrap();
    assert_eq!(doc.info().unwrap().duration(), Ok(Some(1500.0)));
    assert_eq!(doc.clusters().count(), 2);
    assert_eq!(doc.block_count(), 6);
}

#[test]
fn test_output_layout() {
    let fixed = fix_duration(&sample_recording()).unwrap();
    let header_len = ebml_header("webm").len();

    // Segment stays open-ended, clusters get real sizes
    let mut segment_start = Vec::new();
    webm_recorder::webm::ebml::write_id(&mut segment_start, ids::SEGMENT);
    segment_start.extend_from_slice(&UNKNOWN_SIZE);
    assert_eq!(&fixed.bytes[header_len..header_len + 12], segment_start.as_slice());

    let mut cluster_unknown = Vec::new();
    webm_recorder::webm::ebml::write_id(&mut cluster_unknown, ids::CLUSTER);
    cluster_unknown.extend_from_slice(&UNKNOWN_SIZE);
    assert!(!contains(&fixed.bytes, &cluster_unknown));
}

#[test]
fn test_fixing_twice_is_stable() {
    let once = fix_duration(&sample_recording()).unwrap();
    let twice = fix_duration(&once.bytes).unwrap();
    assert_eq!(twice.duration, once.duration);
    assert_eq!(twice.bytes, once.bytes);
}

#[test]
fn test_truncated_upload() {
    let mut bytes = sample_recording();
    // Cut into the last SimpleBlock
    bytes.truncate(bytes.len() - 3);

    let fixed = fix_duration(&bytes).unwrap();
    assert!(fixed.truncated);
    assert_eq!(fixed.duration, 1033.0);

    let doc = WebmDocument::parse(&fixed.bytes).unwrap();
    assert!(!doc.truncated());
    assert_eq!(doc.block_count(), 5);
}

#[test]
fn test_cut_inside_cluster_header() {
    let mut bytes = sample_recording();
    // Add the first two bytes of another Cluster ID
    bytes.extend_from_slice(&[0x1F, 0x43]);

    let fixed = fix_duration(&bytes).unwrap();
    assert!(fixed.truncated);
    assert_eq!(fixed.duration, 1500.0);
}

#[test]
fn test_existing_duration_and_crc_replaced() {
    let mut info_payload = element(ids::CRC32, &[1, 2, 3, 4]);
    info_payload.extend(element(
        ids::TIMECODE_SCALE,
        &webm_recorder::webm::ebml::uint_payload(1_000_000),
    ));
    info_payload.extend(element(
        ids::DURATION,
        &webm_recorder::webm::ebml::float_payload(5.0),
    ));

    let bytes = segment(&[
        element(ids::INFO, &info_payload),
        tracks(),
        unknown_size(ids::CLUSTER, &cluster_payload(0, &[0, 250])),
    ]);

    let fixed = fix_duration(&bytes).unwrap();
    assert_eq!(fixed.duration, 250.0);
    assert!(!contains(&fixed.bytes, &element(ids::CRC32, &[1, 2, 3, 4])));

    let doc = WebmDocument::parse(&fixed.bytes).unwrap();
    assert_eq!(doc.info().unwrap().duration(), Ok(Some(250.0)));
}

#[test]
fn test_seek_head_and_cues_dropped() {
    let seek_head = element(ids::SEEK_HEAD, &element(0x4DBB, &element(0x53AB, &[0x15, 0x49, 0xA9, 0x66])));
    let cues = element(ids::CUES, &element(0xBB, &element(0xB3, &[0])));

    let mut segment_payload = seek_head.clone();
    segment_payload.extend(info(1_000_000, None));
    segment_payload.extend(tracks());
    segment_payload.extend(element(ids::CLUSTER, &cluster_payload(0, &[0, 40])));
    segment_payload.extend(cues.clone());

    let mut bytes = ebml_header("webm");
    bytes.extend(element(ids::SEGMENT, &segment_payload));

    let fixed = fix_duration(&bytes).unwrap();
    assert_eq!(fixed.duration, 40.0);
    assert!(!contains(&fixed.bytes, &seek_head));
    assert!(!contains(&fixed.bytes, &cues));
    assert!(contains(&fixed.bytes, &tracks()));
}

#[test]
fn test_level1_element_ends_open_cluster() {
    let cues = element(ids::CUES, &element(0xBB, &[]));
    let bytes = segment(&[
        info(1_000_000, None),
        tracks(),
        unknown_size(ids::CLUSTER, &cluster_payload(0, &[0, 10])),
        unknown_size(ids::CLUSTER, &cluster_payload(100, &[0, 20])),
        cues,
    ]);

    let doc = WebmDocument::parse(&bytes).unwrap();
    assert_eq!(doc.clusters().count(), 2);
    assert_eq!(doc.block_count(), 4);
    assert_eq!(fix_duration(&bytes).unwrap().duration, 120.0);
}

#[test]
fn test_block_groups_count() {
    let mut payload = cluster_payload(100, &[]);
    payload.extend(block_group(-5));
    payload.extend(simple_block(10));
    let bytes = segment(&[info(1_000_000, None), tracks(), unknown_size(ids::CLUSTER, &payload)]);

    let fixed = fix_duration(&bytes).unwrap();
    assert_eq!(fixed.duration, 15.0);
}

#[test]
fn test_custom_timecode_scale() {
    let bytes = segment(&[
        info(100_000, None),
        tracks(),
        unknown_size(ids::CLUSTER, &cluster_payload(0, &[0])),
        unknown_size(ids::CLUSTER, &cluster_payload(20_000, &[100])),
    ]);

    let fixed = fix_duration(&bytes).unwrap();
    assert_eq!(fixed.timecode_scale, 100_000);
    assert_eq!(fixed.duration, 20_100.0);
    assert_eq!(fixed.as_duration(), Duration::from_millis(2010));
}

#[test]
fn test_missing_info_is_created() {
    let bytes = segment(&[tracks(), unknown_size(ids::CLUSTER, &cluster_payload(0, &[0, 75]))]);

    let fixed = fix_duration(&bytes).unwrap();
    assert_eq!(fixed.timecode_scale, 1_000_000);

    let doc = WebmDocument::parse(&fixed.bytes).unwrap();
    assert_eq!(doc.info().unwrap().duration(), Ok(Some(75.0)));
}

#[test]
fn test_backwards_timecodes_clamp_to_zero() {
    let bytes = live_stream(&[(1000, vec![0]), (0, vec![0])]);
    assert_eq!(fix_duration(&bytes).unwrap().duration, 0.0);
}

#[test]
fn test_out_of_range_cluster_timecode_rejected() {
    let bytes = live_stream(&[(0, vec![0]), (i64::MAX as u64, vec![5])]);
    assert_eq!(
        fix_duration(&bytes).unwrap_err(),
        WebmError::TimecodeOverflow(i64::MAX as u64)
    );

    let bytes = live_stream(&[(u64::MAX, vec![0])]);
    assert_eq!(
        fix_duration(&bytes).unwrap_err(),
        WebmError::TimecodeOverflow(u64::MAX)
    );

    // Right at the edge still fits
    let bytes = live_stream(&[(i64::MAX as u64 - 10, vec![0, 10])]);
    assert_eq!(fix_duration(&bytes).unwrap().duration, 10.0);
}

#[test]
fn test_streams_without_media() {
    let no_clusters = segment(&[info(1_000_000, None), tracks()]);
    assert_eq!(fix_duration(&no_clusters).unwrap_err(), WebmError::NoClusters);

    let no_blocks = live_stream(&[(0, vec![])]);
    assert_eq!(fix_duration(&no_blocks).unwrap_err(), WebmError::NoBlocks);
}

#[test]
fn test_rejects_other_documents() {
    assert_eq!(fix_duration(b"not a webm file").unwrap_err(), WebmError::NotEbml);

    let mut other = ebml_header("avi");
    other.extend(unknown_size(ids::SEGMENT, &[]));
    assert_eq!(
        fix_duration(&other).unwrap_err(),
        WebmError::UnsupportedDocType("avi".to_string())
    );

    let mut headerless = ebml_header("webm");
    headerless.extend(tracks());
    assert_eq!(fix_duration(&headerless).unwrap_err(), WebmError::MissingSegment);
    assert_eq!(
        fix_duration(&ebml_header("webm")).unwrap_err(),
        WebmError::MissingSegment
    );
}

#[test]
fn test_matroska_doc_type_accepted() {
    let mut bytes = ebml_header("matroska");
    bytes.extend(unknown_size(
        ids::SEGMENT,
        &unknown_size(ids::CLUSTER, &cluster_payload(0, &[0, 5])),
    ));
    assert_eq!(fix_duration(&bytes).unwrap().duration, 5.0);
}
