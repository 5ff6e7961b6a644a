//! Cryptographic Operations
//!
//! Key generation and signing for the card's authentication key. The key
//! manager reaches these through the [`CryptoBackend`] trait; the software
//! implementation is built from the RustCrypto `rsa` and `p256` crates.

pub mod backend;
pub mod curves;
pub mod ecc_nist;
pub mod ecdsa;
pub mod hash;
pub mod rsa;

pub use self::backend::{CryptoBackend, KeyPair, SoftwareBackend};
pub use self::curves::{CurveParams, CurveRegistry};
pub use self::ecc_nist::EccNistOperations;
pub use self::ecdsa::{encode_fixed_width, parse_der_ecdsa, EcSignature};
pub use self::hash::DigestAlgorithm;
pub use self::rsa::RsaOperations;

use thiserror::Error;

/// Errors reported by the crypto primitives
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("unsupported curve {0}")]
    UnsupportedCurve(&'static str),

    #[error("malformed DER signature")]
    MalformedSignature,
}
