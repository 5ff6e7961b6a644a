//! RSA Operations
//!
//! RSA key generation and PKCS#1 v1.5 signing of host-computed digests
//! using the rsa crate.

use log::debug;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use super::{CryptoError, DigestAlgorithm};

/// Public exponent used for every generated key
pub const PUBLIC_EXPONENT: u32 = 65537;

/// RSA Operations
pub struct RsaOperations;

impl RsaOperations {
    /// Generate a new RSA key pair
    ///
    /// Returns (private_key_der, public_key_data). The private key is PKCS#1
    /// DER; the public key is `n_len(2) || n || e_len(2) || e`.
    pub fn generate_keypair(bits: usize) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        debug!("Generating RSA-{} keypair", bits);

        let private_key =
            RsaPrivateKey::new_with_exp(&mut OsRng, bits, &BigUint::from(PUBLIC_EXPONENT))
                .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        let private_data = private_key
            .to_pkcs1_der()
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?
            .as_bytes()
            .to_vec();

        let public_data = Self::encode_public_key(&RsaPublicKey::from(&private_key));

        Ok((private_data, public_data))
    }

    /// Encode public key to bytes
    fn encode_public_key(key: &RsaPublicKey) -> Vec<u8> {
        // Format: n_len(2) || n || e_len(2) || e
        let n = key.n().to_bytes_be();
        let e = key.e().to_bytes_be();

        let mut data = Vec::with_capacity(4 + n.len() + e.len());
        data.extend_from_slice(&(n.len() as u16).to_be_bytes());
        data.extend_from_slice(&n);
        data.extend_from_slice(&(e.len() as u16).to_be_bytes());
        data.extend_from_slice(&e);

        data
    }

    /// Decode a private key from stored bytes
    pub fn decode_private_key(data: &[u8]) -> Result<RsaPrivateKey, CryptoError> {
        RsaPrivateKey::from_pkcs1_der(data).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Sign a precomputed digest with PKCS#1 v1.5 padding
    ///
    /// The DigestInfo prefix for `algorithm` is added before padding. The
    /// signature is as long as the modulus.
    pub fn sign_pkcs1v15(
        private_key_der: &[u8],
        algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let private_key = Self::decode_private_key(private_key_der)?;

        let padding = match algorithm {
            DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            DigestAlgorithm::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
            DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        };

        private_key
            .sign(padding, digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }

    /// Get modulus bytes from public key data
    pub fn get_modulus(public_key_data: &[u8]) -> Option<Vec<u8>> {
        if public_key_data.len() < 4 {
            return None;
        }
        let n_len = u16::from_be_bytes([public_key_data[0], public_key_data[1]]) as usize;
        if public_key_data.len() < 2 + n_len {
            return None;
        }
        Some(public_key_data[2..2 + n_len].to_vec())
    }

    /// Get exponent bytes from public key data
    pub fn get_exponent(public_key_data: &[u8]) -> Option<Vec<u8>> {
        if public_key_data.len() < 4 {
            return None;
        }
        let n_len = u16::from_be_bytes([public_key_data[0], public_key_data[1]]) as usize;
        let e_offset = 2 + n_len;
        if public_key_data.len() < e_offset + 2 {
            return None;
        }
        let e_len =
            u16::from_be_bytes([public_key_data[e_offset], public_key_data[e_offset + 1]]) as usize;
        if public_key_data.len() < e_offset + 2 + e_len {
            return None;
        }
        Some(public_key_data[e_offset + 2..e_offset + 2 + e_len].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_sign() {
        let (private, public) = RsaOperations::generate_keypair(2048).unwrap();
        let n = RsaOperations::get_modulus(&public).unwrap();
        let e = RsaOperations::get_exponent(&public).unwrap();
        assert_eq!(n.len(), 256); // 2048 bits = 256 bytes
        assert_eq!(e, vec![0x01, 0x00, 0x01]);

        let digest = DigestAlgorithm::Sha256.hash(b"gate 42");
        let signature =
            RsaOperations::sign_pkcs1v15(&private, DigestAlgorithm::Sha256, &digest).unwrap();
        assert_eq!(signature.len(), 256);

        let public_key = RsaPublicKey::new(
            BigUint::from_bytes_be(&n),
            BigUint::from_bytes_be(&e),
        )
        .unwrap();
        public_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
            .unwrap();
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            RsaOperations::decode_private_key(&[0x30, 0x03, 0x02, 0x01, 0x00]),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_public_key_accessors_short_input() {
        assert!(RsaOperations::get_modulus(&[0x00, 0x10, 0x01]).is_none());
        assert!(RsaOperations::get_exponent(&[0x00, 0x01, 0xAA, 0x00]).is_none());
        assert_eq!(
            RsaOperations::get_exponent(&[0x00, 0x01, 0xAA, 0x00, 0x01, 0x03]),
            Some(vec![0x03])
        );
    }
}
