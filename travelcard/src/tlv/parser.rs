//! BER-TLV Parser
//!
//! Parses BER-TLV structures. Lengths use the definite short or long form
//! (up to 4 length octets); tags are one to three bytes.

use thiserror::Error;

/// Errors that can occur during TLV parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TLVError {
    #[error("Empty data")]
    Empty,

    #[error("Unexpected end of data while parsing tag")]
    UnexpectedEndTag,

    #[error("Unexpected end of data while parsing length")]
    UnexpectedEndLength,

    #[error("Unexpected end of data while parsing value")]
    UnexpectedEndValue,

    #[error("Invalid length encoding")]
    InvalidLength,

    #[error("Length too large: {0}")]
    LengthTooLarge(usize),
}

/// A TLV (Tag-Length-Value) structure
///
/// - `tag`: The tag value (stored as u32 to support 1-3 byte tags)
/// - `value`: The raw value bytes
/// - `subs`: Child TLVs for constructed data objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TLV {
    /// The tag (1-3 bytes encoded as u32)
    pub tag: u32,
    /// The raw value bytes
    pub value: Vec<u8>,
    /// Child TLVs if this is a constructed tag
    pub subs: Vec<TLV>,
}

impl TLV {
    /// Recursively search for a tag (depth-first)
    pub fn find(&self, tag: u32) -> Option<&TLV> {
        if self.tag == tag {
            return Some(self);
        }
        self.subs.iter().find_map(|child| child.find(tag))
    }

    /// Find a direct child by tag (non-recursive)
    pub fn find_child(&self, tag: u32) -> Option<&TLV> {
        self.subs.iter().find(|c| c.tag == tag)
    }
}

fn first_tag_byte(tag: u32) -> u8 {
    if tag > 0xFFFF {
        ((tag >> 16) & 0xFF) as u8
    } else if tag > 0xFF {
        ((tag >> 8) & 0xFF) as u8
    } else {
        (tag & 0xFF) as u8
    }
}

/// Parse multiple TLVs from raw bytes
///
/// Filler bytes (0x00, 0xFF) between objects are skipped. Parsing stops at
/// the first malformed object.
pub fn read_list(data: &[u8], recursive: bool) -> Vec<TLV> {
    let mut result = Vec::new();
    let mut remaining = data;

    while let Some((&first, rest)) = remaining.split_first() {
        if first == 0x00 || first == 0xFF {
            remaining = rest;
            continue;
        }

        match read_single(remaining, recursive) {
            Ok((tlv, rest)) => {
                result.push(tlv);
                remaining = rest;
            }
            Err(_) => break,
        }
    }

    result
}

/// Parse a single TLV and return it with the remaining bytes
pub fn read_single(data: &[u8], recursive: bool) -> Result<(TLV, &[u8]), TLVError> {
    if data.is_empty() {
        return Err(TLVError::Empty);
    }

    let (tag, tag_len) = parse_tag(data)?;
    let (length, len_len) = parse_length(&data[tag_len..])?;
    let offset = tag_len + len_len;

    if offset + length > data.len() {
        return Err(TLVError::UnexpectedEndValue);
    }
    let value = data[offset..offset + length].to_vec();

    let subs = if recursive && (first_tag_byte(tag) & 0x20) != 0 && !value.is_empty() {
        read_list(&value, true)
    } else {
        Vec::new()
    };

    Ok((TLV { tag, value, subs }, &data[offset + length..]))
}

/// Parse a BER tag (1-3 bytes)
fn parse_tag(data: &[u8]) -> Result<(u32, usize), TLVError> {
    let first = *data.first().ok_or(TLVError::UnexpectedEndTag)?;

    // Low 5 bits all set means the tag continues
    if (first & 0x1F) != 0x1F {
        return Ok((first as u32, 1));
    }

    let second = *data.get(1).ok_or(TLVError::UnexpectedEndTag)?;
    if (second & 0x80) == 0 {
        return Ok((((first as u32) << 8) | (second as u32), 2));
    }

    let third = *data.get(2).ok_or(TLVError::UnexpectedEndTag)?;
    Ok((((first as u32) << 16) | ((second as u32) << 8) | (third as u32), 3))
}

/// Parse a BER length (1-5 bytes)
fn parse_length(data: &[u8]) -> Result<(usize, usize), TLVError> {
    let first = *data.first().ok_or(TLVError::UnexpectedEndLength)?;

    // Short form (0-127)
    if (first & 0x80) == 0 {
        return Ok((first as usize, 1));
    }

    let num_bytes = (first & 0x7F) as usize;
    if num_bytes == 0 {
        // Indefinite length - not supported
        return Err(TLVError::InvalidLength);
    }
    if num_bytes > 4 {
        return Err(TLVError::LengthTooLarge(num_bytes));
    }
    if data.len() < 1 + num_bytes {
        return Err(TLVError::UnexpectedEndLength);
    }

    let length = data[1..=num_bytes]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);

    Ok((length, 1 + num_bytes))
}
