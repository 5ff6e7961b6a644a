//! Crypto capability seam
//!
//! The key manager never calls `rsa` or `p256` directly; it asks a
//! [`CryptoBackend`] to build key pairs and produce raw signatures.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::{CryptoError, CurveParams, DigestAlgorithm, EccNistOperations, RsaOperations};
use crate::card::base64_bytes;

/// A generated key pair in backend-specific encodings
///
/// RSA: private key is PKCS#1 DER, public key is `n_len || n || e_len || e`.
/// EC: private key is the raw scalar, public key the uncompressed point.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPair {
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub private_key: Vec<u8>,
}

impl KeyPair {
    pub fn new(private_key: Vec<u8>, public_key: Vec<u8>) -> Self {
        Self {
            public_key,
            private_key,
        }
    }

    /// Both halves present
    pub fn is_initialized(&self) -> bool {
        !self.public_key.is_empty() && !self.private_key.is_empty()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(&self.public_key))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// Key generation and raw signing capability
pub trait CryptoBackend {
    /// Build an RSA key pair with public exponent 65537
    fn generate_rsa(&self, modulus_bits: usize) -> Result<KeyPair, CryptoError>;

    /// Build an EC key pair on the given curve
    fn generate_ec(&self, curve: &CurveParams) -> Result<KeyPair, CryptoError>;

    /// PKCS#1 v1.5 signature over a precomputed digest
    fn sign_rsa_pkcs1(
        &self,
        private_key: &[u8],
        algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// ECDSA signature over a precomputed digest, DER encoded
    fn sign_ecdsa_der(
        &self,
        private_key: &[u8],
        curve: &CurveParams,
        digest: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}

/// Backend built on the RustCrypto crates
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareBackend;

impl CryptoBackend for SoftwareBackend {
    fn generate_rsa(&self, modulus_bits: usize) -> Result<KeyPair, CryptoError> {
        let (private_key, public_key) = RsaOperations::generate_keypair(modulus_bits)?;
        Ok(KeyPair::new(private_key, public_key))
    }

    fn generate_ec(&self, curve: &CurveParams) -> Result<KeyPair, CryptoError> {
        let (private_key, public_key) = EccNistOperations::generate_keypair(curve)?;
        Ok(KeyPair::new(private_key, public_key))
    }

    fn sign_rsa_pkcs1(
        &self,
        private_key: &[u8],
        algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        RsaOperations::sign_pkcs1v15(private_key, algorithm, digest)
    }

    fn sign_ecdsa_der(
        &self,
        private_key: &[u8],
        curve: &CurveParams,
        digest: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        EccNistOperations::sign_prehash_der(curve, private_key, digest)
    }
}
