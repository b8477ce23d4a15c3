// SPDX-License-Identifier: MPL-2.0

//! EBML primitives
//!
//! Element IDs and sizes are variable-length integers: the number of leading
//! zero bits in the first byte gives the total length (1-8 bytes). IDs keep
//! their marker bit, sizes drop it. A size with every value bit set means
//! "unknown", which browser recorders use for live Segments and Clusters.
//!
//! Readers return `Ok(None)` when the buffer ends before the value does, so
//! callers can tell a cut-off upload from corrupt data.

use crate::errors::WebmError;

/// Largest encodable size; the all-ones 8 byte pattern is reserved for unknown
pub const MAX_SIZE: u64 = (1 << 56) - 2;

/// 8 byte "unknown size" marker
pub const UNKNOWN_SIZE: [u8; 8] = [0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

/// Header of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementHeader {
    pub id: u32,
    /// Payload size, `None` when unknown
    pub size: Option<u64>,
    /// Offset of the first header byte
    pub offset: usize,
    /// Length of ID plus size fields
    pub header_len: usize,
}

impl ElementHeader {
    /// Offset of the first payload byte
    pub fn data_offset(&self) -> usize {
        self.offset + self.header_len
    }

    /// Offset one past the payload, if the size is known
    pub fn end(&self) -> Option<usize> {
        self.size
            .and_then(|size| usize::try_from(size).ok())
            .and_then(|size| self.data_offset().checked_add(size))
    }
}

fn vint_len(first: u8) -> Option<usize> {
    match first.leading_zeros() {
        n @ 0..=7 => Some(n as usize + 1),
        _ => None,
    }
}

/// Read an element ID at `pos`
///
/// # Returns
/// * `Ok(Some((id, len)))` - The ID with marker bits and its encoded length
/// * `Ok(None)` - The buffer ends inside the ID
pub fn read_id(buf: &[u8], pos: usize) -> Result<Option<(u32, usize)>, WebmError> {
    let Some(&first) = buf.get(pos) else {
        return Ok(None);
    };
    let len = match vint_len(first) {
        Some(len) if len <= 4 => len,
        _ => return Err(WebmError::InvalidVint(pos)),
    };
    let Some(bytes) = buf.get(pos..pos + len) else {
        return Ok(None);
    };
    let id = bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
    Ok(Some((id, len)))
}

/// Read an element size at `pos`
///
/// # Returns
/// * `Ok(Some((size, len)))` - The size (`None` if unknown) and its encoded length
/// * `Ok(None)` - The buffer ends inside the size
pub fn read_size(buf: &[u8], pos: usize) -> Result<Option<(Option<u64>, usize)>, WebmError> {
    let Some(&first) = buf.get(pos) else {
        return Ok(None);
    };
    let len = vint_len(first).ok_or(WebmError::InvalidVint(pos))?;
    let Some(bytes) = buf.get(pos..pos + len) else {
        return Ok(None);
    };

    let marker_mask = 0xFFu8.checked_shr(len as u32).unwrap_or(0);
    let mut value = (first & marker_mask) as u64;
    for &b in &bytes[1..] {
        value = (value << 8) | b as u64;
    }

    let all_ones = (1u64 << (7 * len)) - 1;
    let size = if value == all_ones { None } else { Some(value) };
    Ok(Some((size, len)))
}

/// Read the ID and size of the element at `pos`
pub fn read_header(buf: &[u8], pos: usize) -> Result<Option<ElementHeader>, WebmError> {
    let Some((id, id_len)) = read_id(buf, pos)? else {
        return Ok(None);
    };
    let Some((size, size_len)) = read_size(buf, pos + id_len)? else {
        return Ok(None);
    };
    Ok(Some(ElementHeader {
        id,
        size,
        offset: pos,
        header_len: id_len + size_len,
    }))
}

/// Append an element ID
pub fn write_id(out: &mut Vec<u8>, id: u32) {
    let bytes = id.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(3);
    out.extend_from_slice(&bytes[skip..]);
}

/// Append a size using the shortest encoding
pub fn write_size(out: &mut Vec<u8>, size: u64) -> Result<(), WebmError> {
    if size > MAX_SIZE {
        return Err(WebmError::Unencodable(size));
    }
    // A length whose all-ones value equals `size` would read back as unknown
    let len = (1..=8usize)
        .find(|&len| size < (1u64 << (7 * len)) - 1)
        .ok_or(WebmError::Unencodable(size))?;

    let marked = size | (1u64 << (7 * len));
    out.extend_from_slice(&marked.to_be_bytes()[8 - len..]);
    Ok(())
}

/// Append a complete element with the given payload
pub fn write_element(out: &mut Vec<u8>, id: u32, payload: &[u8]) -> Result<(), WebmError> {
    write_id(out, id);
    write_size(out, payload.len() as u64)?;
    out.extend_from_slice(payload);
    Ok(())
}

/// Decode an unsigned integer payload (0-8 bytes, big-endian)
pub fn read_uint(id: u32, payload: &[u8]) -> Result<u64, WebmError> {
    if payload.len() > 8 {
        return Err(WebmError::InvalidPayload {
            id,
            len: payload.len(),
        });
    }
    Ok(payload.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

/// Decode a float payload (0, 4 or 8 bytes)
pub fn read_float(id: u32, payload: &[u8]) -> Result<f64, WebmError> {
    match payload.len() {
        0 => Ok(0.0),
        4 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(payload);
            Ok(f32::from_be_bytes(bytes) as f64)
        }
        8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(payload);
            Ok(f64::from_be_bytes(bytes))
        }
        len => Err(WebmError::InvalidPayload { id, len }),
    }
}

/// Encode an unsigned integer payload with no leading zero bytes
pub fn uint_payload(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    bytes[skip..].to_vec()
}

/// Encode an 8 byte float payload
pub fn float_payload(value: f64) -> [u8; 8] {
    value.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_ids() {
        assert_eq!(read_id(&[0xA3], 0).unwrap(), Some((0xA3, 1)));
        assert_eq!(
            read_id(&[0x1F, 0x43, 0xB6, 0x75], 0).unwrap(),
            Some((0x1F43_B675, 4))
        );
        assert_eq!(read_id(&[0x1F, 0x43], 0).unwrap(), None);
        assert_eq!(read_id(&[0x00], 0), Err(WebmError::InvalidVint(0)));
        // IDs longer than 4 bytes are not valid
        assert_eq!(read_id(&[0x08, 0, 0, 0, 0], 0), Err(WebmError::InvalidVint(0)));
    }

    #[test]
    fn test_read_sizes() {
        assert_eq!(read_size(&[0x81], 0).unwrap(), Some((Some(1), 1)));
        assert_eq!(read_size(&[0x40, 0x02], 0).unwrap(), Some((Some(2), 2)));
        assert_eq!(read_size(&[0xFF], 0).unwrap(), Some((None, 1)));
        assert_eq!(read_size(&UNKNOWN_SIZE, 0).unwrap(), Some((None, 8)));
        assert_eq!(read_size(&[0x40], 0).unwrap(), None);
    }

    #[test]
    fn test_write_size_avoids_unknown_pattern() {
        let mut out = Vec::new();
        write_size(&mut out, 126).unwrap();
        assert_eq!(out, vec![0xFE]);

        // 127 is all ones in one byte, so it needs two
        out.clear();
        write_size(&mut out, 127).unwrap();
        assert_eq!(out, vec![0x40, 0x7F]);
        assert_eq!(read_size(&out, 0).unwrap(), Some((Some(127), 2)));

        assert_eq!(
            write_size(&mut out, MAX_SIZE + 1),
            Err(WebmError::Unencodable(MAX_SIZE + 1))
        );
    }

    #[test]
    fn test_write_id_strips_leading_zeros() {
        let mut out = Vec::new();
        write_id(&mut out, 0x4489);
        write_id(&mut out, 0x1A45_DFA3);
        assert_eq!(out, vec![0x44, 0x89, 0x1A, 0x45, 0xDF, 0xA3]);
    }

    #[test]
    fn test_header_offsets() {
        let buf = [0x00, 0xE7, 0x82, 0x01, 0x02];
        let header = read_header(&buf, 1).unwrap().unwrap();
        assert_eq!(header.id, 0xE7);
        assert_eq!(header.size, Some(2));
        assert_eq!(header.data_offset(), 3);
        assert_eq!(header.end(), Some(5));
    }

    #[test]
    fn test_numeric_payloads() {
        assert_eq!(uint_payload(0), vec![0]);
        assert_eq!(uint_payload(1_000_000), vec![0x0F, 0x42, 0x40]);
        assert_eq!(read_uint(0x2A_D7B1, &[0x0F, 0x42, 0x40]).unwrap(), 1_000_000);
        assert_eq!(read_float(0x4489, &float_payload(1234.5)).unwrap(), 1234.5);
        assert_eq!(read_float(0x4489, &2.5f32.to_be_bytes()).unwrap(), 2.5);
        assert!(read_float(0x4489, &[0, 0, 0]).is_err());
    }
}
