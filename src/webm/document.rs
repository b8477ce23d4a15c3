// SPDX-License-Identifier: MPL-2.0

//! WebM document model
//!
//! Just enough structure to rewrite a recorder's live output: the EBML
//! header is kept verbatim, Info is editable, Clusters are decoded for block
//! timing and everything else at level 1 is carried as raw bytes.
//!
//! Live recorders write the Segment and each Cluster with unknown size. An
//! unknown-size Cluster ends where the next level 1 element starts.

use tracing::{debug, warn};

use super::ebml::{
    self, ElementHeader, UNKNOWN_SIZE, read_float, read_header, read_uint, write_element,
    write_id,
};
use super::ids;
use crate::constants::DEFAULT_TIMECODE_SCALE;
use crate::errors::WebmError;

/// A complete element kept as encoded bytes
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub id: u32,
    header_len: usize,
    bytes: Vec<u8>,
}

impl RawElement {
    fn from_slice(header: &ElementHeader, bytes: &[u8]) -> Self {
        Self {
            id: header.id,
            header_len: header.header_len,
            bytes: bytes.to_vec(),
        }
    }

    fn encode(id: u32, payload: &[u8]) -> Result<Self, WebmError> {
        let mut bytes = Vec::with_capacity(payload.len() + 12);
        write_element(&mut bytes, id, payload)?;
        Ok(Self {
            id,
            header_len: bytes.len() - payload.len(),
            bytes,
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[self.header_len..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Iterate the sized children of a master element payload
fn sized_children(payload: &[u8]) -> Result<Vec<(ElementHeader, &[u8])>, WebmError> {
    let mut children = Vec::new();
    let mut pos = 0;
    while pos < payload.len() {
        let header = read_header(payload, pos)?.ok_or(WebmError::Overrun {
            id: 0,
            offset: pos,
        })?;
        let end = header.end().ok_or(WebmError::UnknownSize {
            id: header.id,
            offset: pos,
        })?;
        if end > payload.len() {
            return Err(WebmError::Overrun {
                id: header.id,
                offset: pos,
            });
        }
        children.push((header, &payload[pos..end]));
        pos = end;
    }
    Ok(children)
}

/// Segment Info
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    children: Vec<RawElement>,
}

impl Default for Info {
    fn default() -> Self {
        let scale = ebml::uint_payload(DEFAULT_TIMECODE_SCALE);
        // Encoding a 3 byte payload cannot fail
        let children = RawElement::encode(ids::TIMECODE_SCALE, &scale)
            .map(|e| vec![e])
            .unwrap_or_default();
        Self { children }
    }
}

impl Info {
    fn parse(payload: &[u8]) -> Result<Self, WebmError> {
        let children = sized_children(payload)?
            .into_iter()
            .map(|(header, bytes)| RawElement::from_slice(&header, bytes))
            .collect();
        Ok(Self { children })
    }

    fn child(&self, id: u32) -> Option<&RawElement> {
        self.children.iter().find(|c| c.id == id)
    }

    /// Nanoseconds per timecode unit
    pub fn timecode_scale(&self) -> Result<u64, WebmError> {
        match self.child(ids::TIMECODE_SCALE) {
            Some(element) => read_uint(element.id, element.payload()),
            None => Ok(DEFAULT_TIMECODE_SCALE),
        }
    }

    /// Duration in timecode units, if present
    pub fn duration(&self) -> Result<Option<f64>, WebmError> {
        self.child(ids::DURATION)
            .map(|element| read_float(element.id, element.payload()))
            .transpose()
    }

    /// Set Duration, replacing an existing one or placing it after TimecodeScale
    pub fn set_duration(&mut self, duration: f64) -> Result<(), WebmError> {
        let element = RawElement::encode(ids::DURATION, &ebml::float_payload(duration))?;

        // A checksum over the old payload would no longer match
        self.children.retain(|c| c.id != ids::CRC32);

        if let Some(existing) = self.children.iter_mut().find(|c| c.id == ids::DURATION) {
            *existing = element;
            return Ok(());
        }

        let index = self
            .children
            .iter()
            .position(|c| c.id == ids::TIMECODE_SCALE)
            .map(|i| i + 1)
            .unwrap_or(self.children.len());
        self.children.insert(index, element);
        Ok(())
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), WebmError> {
        let payload: Vec<u8> = self
            .children
            .iter()
            .flat_map(|c| c.as_bytes().iter().copied())
            .collect();
        write_element(out, ids::INFO, &payload)
    }
}

/// A decoded Cluster
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cluster {
    /// Absolute timecode in timecode units
    pub timecode: u64,
    /// Relative timecodes of the blocks, in stream order
    pub block_timecodes: Vec<i16>,
    body: Vec<u8>,
}

impl Cluster {
    /// Absolute timecode of a block at `relative` to this cluster
    pub fn block_time(&self, relative: i16) -> Result<i64, WebmError> {
        i64::try_from(self.timecode)
            .ok()
            .and_then(|base| base.checked_add(i64::from(relative)))
            .ok_or(WebmError::TimecodeOverflow(self.timecode))
    }

    /// Absolute timecode of the first block
    pub fn first_block_time(&self) -> Result<Option<i64>, WebmError> {
        self.block_timecodes
            .first()
            .map(|&t| self.block_time(t))
            .transpose()
    }

    /// Absolute timecode of the last block
    pub fn last_block_time(&self) -> Result<Option<i64>, WebmError> {
        self.block_timecodes
            .last()
            .map(|&t| self.block_time(t))
            .transpose()
    }
}

/// Relative timecode of a SimpleBlock or Block payload
fn block_timecode(id: u32, payload: &[u8]) -> Result<i16, WebmError> {
    let invalid = || WebmError::InvalidPayload {
        id,
        len: payload.len(),
    };
    let (_, track_len) = ebml::read_size(payload, 0)
        .map_err(|_| invalid())?
        .ok_or_else(invalid)?;
    let bytes = payload.get(track_len..track_len + 2).ok_or_else(invalid)?;
    Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
}

#[derive(Debug, Clone, PartialEq)]
enum SegmentChild {
    Info(Info),
    Cluster(Cluster),
    Raw(RawElement),
}

/// A parsed WebM stream
#[derive(Debug, Clone, PartialEq)]
pub struct WebmDocument {
    ebml_header: Vec<u8>,
    children: Vec<SegmentChild>,
    truncated: bool,
}

impl WebmDocument {
    /// Parse a WebM stream
    ///
    /// A stream cut off mid-element is accepted: the incomplete element is
    /// dropped (complete blocks of a cut-off Cluster are kept) and
    /// [`WebmDocument::truncated`] reports it.
    pub fn parse(buf: &[u8]) -> Result<Self, WebmError> {
        let header = read_header(buf, 0)
            .map_err(|_| WebmError::NotEbml)?
            .ok_or(WebmError::NotEbml)?;
        if header.id != ids::EBML {
            return Err(WebmError::NotEbml);
        }
        let header_end = header
            .end()
            .filter(|&end| end <= buf.len())
            .ok_or(WebmError::NotEbml)?;
        check_doc_type(&buf[header.data_offset()..header_end])?;

        let segment = find_segment(buf, header_end)?;
        let (segment_end, mut truncated) = match segment.end() {
            Some(end) if end <= buf.len() => (end, false),
            Some(_) => (buf.len(), true),
            None => (buf.len(), false),
        };
        let buf = &buf[..segment_end];

        let mut children = Vec::new();
        let mut pos = segment.data_offset();
        while pos < segment_end {
            let Some(child) = read_header(buf, pos)? else {
                truncated = true;
                break;
            };

            if ids::is_top_level(child.id) {
                debug!(offset = pos, "Ignoring data after the first segment");
                break;
            }

            if child.id == ids::CLUSTER {
                let (cluster, next, cut) = parse_cluster(buf, &child)?;
                if !cluster.body.is_empty() {
                    children.push(SegmentChild::Cluster(cluster));
                }
                if cut {
                    truncated = true;
                    break;
                }
                pos = next;
                continue;
            }

            let end = child.end().ok_or(WebmError::UnknownSize {
                id: child.id,
                offset: pos,
            })?;
            if end > segment_end {
                truncated = true;
                break;
            }

            let raw = RawElement::from_slice(&child, &buf[pos..end]);
            if child.id == ids::INFO {
                children.push(SegmentChild::Info(Info::parse(raw.payload())?));
            } else {
                children.push(SegmentChild::Raw(raw));
            }
            pos = end;
        }

        if !children.iter().any(|c| matches!(c, SegmentChild::Info(_))) {
            debug!("Segment has no Info, adding a default one");
            children.insert(0, SegmentChild::Info(Info::default()));
        }

        if truncated {
            warn!(bytes = segment_end, "WebM stream is truncated");
        }

        Ok(Self {
            ebml_header: buf[..header_end].to_vec(),
            children,
            truncated,
        })
    }

    /// Whether the input ended inside an element
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn info(&self) -> Option<&Info> {
        self.children.iter().find_map(|c| match c {
            SegmentChild::Info(info) => Some(info),
            _ => None,
        })
    }

    pub fn info_mut(&mut self) -> Option<&mut Info> {
        self.children.iter_mut().find_map(|c| match c {
            SegmentChild::Info(info) => Some(info),
            _ => None,
        })
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.children.iter().filter_map(|c| match c {
            SegmentChild::Cluster(cluster) => Some(cluster),
            _ => None,
        })
    }

    /// Total number of blocks across all clusters
    pub fn block_count(&self) -> usize {
        self.clusters().map(|c| c.block_timecodes.len()).sum()
    }

    /// Serialize the document
    ///
    /// The Segment is written with unknown size and each Cluster with its
    /// exact size. SeekHead and Cues are dropped since their offsets refer
    /// to the original layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WebmError> {
        let mut out = Vec::with_capacity(self.ebml_header.len() + self.body_len_hint());
        out.extend_from_slice(&self.ebml_header);
        write_id(&mut out, ids::SEGMENT);
        out.extend_from_slice(&UNKNOWN_SIZE);

        for child in &self.children {
            match child {
                SegmentChild::Info(info) => info.write(&mut out)?,
                SegmentChild::Cluster(cluster) => write_element(&mut out, ids::CLUSTER, &cluster.body)?,
                SegmentChild::Raw(raw) if raw.id == ids::SEEK_HEAD || raw.id == ids::CUES => {}
                SegmentChild::Raw(raw) => out.extend_from_slice(raw.as_bytes()),
            }
        }

        Ok(out)
    }

    fn body_len_hint(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c {
                SegmentChild::Cluster(cluster) => cluster.body.len() + 12,
                SegmentChild::Raw(raw) => raw.as_bytes().len(),
                SegmentChild::Info(_) => 64,
            })
            .sum()
    }
}

fn check_doc_type(payload: &[u8]) -> Result<(), WebmError> {
    for (header, bytes) in sized_children(payload)? {
        if header.id != ids::DOC_TYPE {
            continue;
        }
        let doc_type = String::from_utf8_lossy(&bytes[header.header_len..]);
        let doc_type = doc_type.trim_end_matches('\0');
        return match doc_type {
            "webm" | "matroska" => Ok(()),
            other => Err(WebmError::UnsupportedDocType(other.to_string())),
        };
    }
    Ok(())
}

/// Locate the Segment header, skipping Void/CRC elements before it
fn find_segment(buf: &[u8], mut pos: usize) -> Result<ElementHeader, WebmError> {
    loop {
        let Some(header) = read_header(buf, pos)? else {
            return Err(WebmError::MissingSegment);
        };
        match header.id {
            ids::SEGMENT => return Ok(header),
            ids::VOID | ids::CRC32 => {
                pos = header.end().ok_or(WebmError::MissingSegment)?;
            }
            _ => return Err(WebmError::MissingSegment),
        }
    }
}

/// Parse one Cluster starting at `header`
///
/// Returns the cluster, the offset after it and whether the input was cut
/// off inside it.
fn parse_cluster(buf: &[u8], header: &ElementHeader) -> Result<(Cluster, usize, bool), WebmError> {
    let (limit, mut cut) = match header.end() {
        Some(end) if end <= buf.len() => (end, false),
        Some(_) => (buf.len(), true),
        None => (buf.len(), false),
    };
    let open_ended = header.size.is_none();
    let region = &buf[..limit];

    let mut cluster = Cluster::default();
    let mut pos = header.data_offset();
    while pos < limit {
        let Some(child) = read_header(region, pos)? else {
            cut = true;
            break;
        };

        if open_ended && (ids::is_level1(child.id) || ids::is_top_level(child.id)) {
            return Ok((cluster, pos, false));
        }

        let end = child.end().ok_or(WebmError::UnknownSize {
            id: child.id,
            offset: pos,
        })?;
        if end > limit {
            cut = true;
            break;
        }

        let payload = &region[child.data_offset()..end];
        match child.id {
            ids::TIMECODE => cluster.timecode = read_uint(child.id, payload)?,
            ids::SIMPLE_BLOCK => cluster
                .block_timecodes
                .push(block_timecode(child.id, payload)?),
            ids::BLOCK_GROUP => {
                for (group_child, bytes) in sized_children(payload)? {
                    if group_child.id == ids::BLOCK {
                        let block = &bytes[group_child.header_len..];
                        cluster
                            .block_timecodes
                            .push(block_timecode(group_child.id, block)?);
                    }
                }
            }
            _ => {}
        }

        cluster.body.extend_from_slice(&region[pos..end]);
        pos = end;
    }

    Ok((cluster, pos, cut))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_timecode() {
        // Track 1, timecode -2, flags
        assert_eq!(block_timecode(ids::SIMPLE_BLOCK, &[0x81, 0xFF, 0xFE, 0x80]), Ok(-2));
        assert!(block_timecode(ids::SIMPLE_BLOCK, &[0x81, 0x00]).is_err());
    }

    #[test]
    fn test_block_time_range() {
        let cluster = Cluster {
            timecode: 1000,
            block_timecodes: vec![-20, 35],
            body: Vec::new(),
        };
        assert_eq!(cluster.first_block_time(), Ok(Some(980)));
        assert_eq!(cluster.last_block_time(), Ok(Some(1035)));
        assert_eq!(Cluster::default().first_block_time(), Ok(None));

        let edge = Cluster {
            timecode: i64::MAX as u64,
            block_timecodes: vec![-1, 1],
            body: Vec::new(),
        };
        assert_eq!(edge.first_block_time(), Ok(Some(i64::MAX - 1)));
        assert_eq!(
            edge.last_block_time(),
            Err(WebmError::TimecodeOverflow(i64::MAX as u64))
        );

        let unsigned = Cluster {
            timecode: u64::MAX,
            block_timecodes: vec![-5],
            body: Vec::new(),
        };
        assert_eq!(
            unsigned.first_block_time(),
            Err(WebmError::TimecodeOverflow(u64::MAX))
        );
    }

    #[test]
    fn test_default_info() {
        let mut info = Info::default();
        assert_eq!(info.timecode_scale(), Ok(DEFAULT_TIMECODE_SCALE));
        assert_eq!(info.duration(), Ok(None));

        info.set_duration(42.0).unwrap();
        info.set_duration(43.0).unwrap();
        assert_eq!(info.duration(), Ok(Some(43.0)));
        assert_eq!(info.children.len(), 2);
        assert_eq!(info.children[1].id, ids::DURATION);
    }

    #[test]
    fn test_rejects_non_ebml() {
        assert_eq!(WebmDocument::parse(b"RIFF...."), Err(WebmError::NotEbml));
        assert_eq!(WebmDocument::parse(&[]), Err(WebmError::NotEbml));
    }
}
