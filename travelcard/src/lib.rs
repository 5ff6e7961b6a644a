//! Software model of a travel card authentication applet
//!
//! The applet speaks ISO 7816-4 APDUs. It holds one authentication key
//! slot (RSA or NIST P-256), a cardholder certificate and a digital
//! signature counter, and supports:
//! - command chaining and GET RESPONSE output segmentation
//! - GET DATA / GET NEXT DATA / PUT DATA on tagged data objects
//! - key pair generation and INTERNAL AUTHENTICATE over host digests
//!
//! # Example
//! ```ignore
//! use travelcard::{CardConfig, TravelCardApplet};
//!
//! let mut card = TravelCardApplet::new(CardConfig::default());
//! let response = card.process_apdu(&[0x00, 0xCA, 0x00, 0x6E, 0x00]);
//! assert_eq!(&response[response.len() - 2..], &[0x90, 0x00]);
//! ```

pub mod apdu;
pub mod applet;
pub mod card;
pub mod config;
pub mod crypto;
pub mod error;
pub mod tlv;

pub use applet::TravelCardApplet;
pub use config::CardConfig;
pub use error::CardError;
