//! APDU (Application Protocol Data Unit) handling
//!
//! Flat structs and a parser for the ISO 7816-4 command frames the applet
//! receives, plus the response type it sends back.
//!
//! # Example
//! ```ignore
//! use travelcard::apdu::{parse_apdu, Response};
//!
//! let raw = &[0x00, 0xCA, 0x00, 0x6E, 0x00];
//! let apdu = parse_apdu(raw).unwrap();
//! assert_eq!(apdu.p1p2(), 0x006E);
//! ```

mod response;
mod status;

pub use response::Response;
pub use status::SW;

use thiserror::Error;

/// Class byte bit signalling that more command frames follow
pub const CLA_MASK_CHAINING: u8 = 0x10;

/// Errors that can occur during APDU parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum APDUError {
    #[error("APDU too short: expected at least 4 bytes, got {0}")]
    TooShort(usize),

    #[error("Invalid APDU length")]
    InvalidLength,

    #[error("Invalid extended APDU format")]
    InvalidExtendedFormat,
}

/// A parsed APDU command
///
/// - `cla`: Class byte (bit 0x10 marks command chaining)
/// - `ins`: Instruction byte
/// - `p1`, `p2`: Parameter bytes
/// - `data`: Command data (may be empty)
/// - `le`: Expected response length (None if not specified)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APDU {
    /// Class byte (CLA)
    pub cla: u8,
    /// Instruction byte (INS)
    pub ins: u8,
    /// Parameter 1 (P1)
    pub p1: u8,
    /// Parameter 2 (P2)
    pub p2: u8,
    /// Command data (may be empty)
    pub data: Vec<u8>,
    /// Expected response length (Le), None if not specified
    pub le: Option<u32>,
}

impl APDU {
    /// Create a new APDU with just the header (CLA, INS, P1, P2)
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Create a new APDU with data
    pub fn with_data(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data,
            le: None,
        }
    }

    /// Check if this is a chained APDU (CLA bit 4 set)
    pub fn is_chained(&self) -> bool {
        (self.cla & CLA_MASK_CHAINING) != 0
    }

    /// Get P1-P2 combined as a u16 (the data object tag for GET/PUT DATA)
    pub fn p1p2(&self) -> u16 {
        ((self.p1 as u16) << 8) | (self.p2 as u16)
    }

    /// Encode back to raw bytes, short form when possible
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.cla, self.ins, self.p1, self.p2];
        let extended = self.data.len() > 255 || self.le.map_or(false, |le| le > 256);

        if extended {
            out.push(0x00);
            if !self.data.is_empty() {
                out.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
                out.extend_from_slice(&self.data);
            }
            if let Some(le) = self.le {
                out.extend_from_slice(&((le & 0xFFFF) as u16).to_be_bytes());
            }
        } else {
            if !self.data.is_empty() {
                out.push(self.data.len() as u8);
                out.extend_from_slice(&self.data);
            }
            if let Some(le) = self.le {
                out.push((le & 0xFF) as u8);
            }
        }
        out
    }
}

/// Parse raw bytes into an APDU
///
/// Supports both short and extended APDU formats:
/// - Short: CLA INS P1 P2 [Lc Data] [Le]
/// - Extended: CLA INS P1 P2 00 Lc1 Lc2 Data [Le1 Le2]
pub fn parse_apdu(data: &[u8]) -> Result<APDU, APDUError> {
    if data.len() < 4 {
        return Err(APDUError::TooShort(data.len()));
    }

    let cla = data[0];
    let ins = data[1];
    let p1 = data[2];
    let p2 = data[3];

    // Case 1: CLA INS P1 P2
    if data.len() == 4 {
        return Ok(APDU::new(cla, ins, p1, p2));
    }

    let remaining = &data[4..];

    // Extended format: 00 Lc1 Lc2 [Data] [Le1 Le2]
    if remaining[0] == 0x00 && remaining.len() > 2 {
        let ext_remaining = &remaining[1..];
        let potential_lc = ((ext_remaining[0] as usize) << 8) | (ext_remaining[1] as usize);
        let is_valid_extended = ext_remaining.len() == 2
            || ext_remaining.len() == 2 + potential_lc
            || ext_remaining.len() == 2 + potential_lc + 2;

        if is_valid_extended {
            return parse_extended_apdu(cla, ins, p1, p2, ext_remaining);
        }
    }

    parse_short_apdu(cla, ins, p1, p2, remaining)
}

/// Parse short format APDU (Lc/Le up to 255 bytes)
fn parse_short_apdu(
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    remaining: &[u8],
) -> Result<APDU, APDUError> {
    if remaining.is_empty() {
        return Ok(APDU::new(cla, ins, p1, p2));
    }

    let first_byte = remaining[0];

    // Case 2: Only Le - Le=0 means 256
    if remaining.len() == 1 {
        let le = if first_byte == 0 { 256 } else { first_byte as u32 };
        return Ok(APDU {
            cla, ins, p1, p2,
            data: Vec::new(),
            le: Some(le),
        });
    }

    let lc = first_byte as usize;

    // Case 3: Lc + Data
    if remaining.len() == 1 + lc {
        return Ok(APDU {
            cla, ins, p1, p2,
            data: remaining[1..1 + lc].to_vec(),
            le: None,
        });
    }

    // Case 4: Lc + Data + Le
    if remaining.len() == 1 + lc + 1 {
        let le_byte = remaining[1 + lc];
        let le = if le_byte == 0 { 256 } else { le_byte as u32 };
        return Ok(APDU {
            cla, ins, p1, p2,
            data: remaining[1..1 + lc].to_vec(),
            le: Some(le),
        });
    }

    Err(APDUError::InvalidLength)
}

/// Parse extended format APDU (Lc/Le up to 65535 bytes)
fn parse_extended_apdu(
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    remaining: &[u8],
) -> Result<APDU, APDUError> {
    if remaining.len() < 2 {
        return Err(APDUError::InvalidExtendedFormat);
    }

    let first_word = ((remaining[0] as u32) << 8) | (remaining[1] as u32);

    // Case 2E: Only extended Le - Le=0 means 65536
    if remaining.len() == 2 {
        let le = if first_word == 0 { 65536 } else { first_word };
        return Ok(APDU {
            cla, ins, p1, p2,
            data: Vec::new(),
            le: Some(le),
        });
    }

    let lc = first_word as usize;
    if remaining.len() < 2 + lc {
        return Err(APDUError::InvalidLength);
    }

    let cmd_data = remaining[2..2 + lc].to_vec();

    // Case 3E
    if remaining.len() == 2 + lc {
        return Ok(APDU {
            cla, ins, p1, p2,
            data: cmd_data,
            le: None,
        });
    }

    // Case 4E
    if remaining.len() == 2 + lc + 2 {
        let le_word = ((remaining[2 + lc] as u32) << 8) | (remaining[2 + lc + 1] as u32);
        let le = if le_word == 0 { 65536 } else { le_word };
        return Ok(APDU {
            cla, ins, p1, p2,
            data: cmd_data,
            le: Some(le),
        });
    }

    Err(APDUError::InvalidExtendedFormat)
}

/// Instruction bytes understood by the applet
pub mod ins {
    pub const SELECT: u8 = 0xA4;
    pub const GET_DATA: u8 = 0xCA;
    pub const GET_NEXT_DATA: u8 = 0xCC;
    pub const PUT_DATA: u8 = 0xDA;
    pub const PUT_DATA_ODD: u8 = 0xDB;
    pub const GENERATE_ASYMMETRIC_KEY_PAIR: u8 = 0x47;
    pub const INTERNAL_AUTHENTICATE: u8 = 0x88;
    pub const GET_RESPONSE: u8 = 0xC0;
}
