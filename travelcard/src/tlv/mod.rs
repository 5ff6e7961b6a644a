//! TLV (Tag-Length-Value) encoding and decoding
//!
//! ISO 7816 BER-TLV as used by the applet's data objects, the public key
//! template, and the DER signatures produced by the ECDSA primitive.
//!
//! # Example
//! ```ignore
//! use travelcard::tlv::{read_list, TLVBuilder};
//!
//! let data = TLVBuilder::new().add(0x93, &[0, 0, 1]).wrap(0x7A).build();
//! let tlvs = read_list(&data, true);
//! assert_eq!(tlvs[0].subs[0].tag, 0x93);
//! ```

mod encoder;
mod parser;

pub use encoder::{TLVBuilder, TLVEncoder};
pub use parser::{read_list, read_single, TLVError, TLV};

/// Convert a byte slice to a spaced hex string for log output
pub fn hexify(value: &[u8]) -> String {
    value.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}

/// Data object tags used by the applet
pub mod tags {
    // Application identification
    pub const AID: u16 = 0x004F;
    pub const LIFE_CYCLE_STATUS: u16 = 0x008A;
    pub const SELECT_RESPONSE: u16 = 0x0064;

    // Application related data
    pub const APPLICATION_RELATED_DATA: u16 = 0x006E;
    pub const SECURITY_SUPPORT_TEMPLATE: u16 = 0x007A;
    pub const DIGITAL_SIG_COUNTER: u16 = 0x0093;
    pub const EXTENDED_LENGTH_INFORMATION: u16 = 0x7F66;

    // Key data
    pub const CARDHOLDER_CERTIFICATE: u16 = 0x7F21;
    pub const ALGORITHM_ATTRIBUTES_AUT: u16 = 0x00C3;
    pub const PUBLIC_KEY_TEMPLATE: u16 = 0x7F49;

    // CRT (Control Reference Template)
    pub const CRT_AUTHENTICATION_KEY: u16 = 0xA400;

    // Key component tags (within 7F49)
    pub const RSA_MODULUS: u8 = 0x81;
    pub const RSA_EXPONENT: u8 = 0x82;
    pub const ECC_PUBLIC_KEY: u8 = 0x86;

    // DER (ASN.1) universal tags
    pub const DER_INTEGER: u8 = 0x02;
    pub const DER_SEQUENCE: u8 = 0x30;
}
