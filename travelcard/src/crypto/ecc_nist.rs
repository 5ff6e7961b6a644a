//! NIST ECC Operations
//!
//! ECDSA key generation and prehash signing using the p256 crate. Curves
//! are identified by the domain parameters handed in from the registry.

use log::debug;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature as P256Signature, SigningKey as P256SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;

use super::curves::{CurveParams, ANSIX9P256R1};
use super::CryptoError;

/// NIST ECC Operations
pub struct EccNistOperations;

impl EccNistOperations {
    /// Generate a new ECC key pair on `curve`
    ///
    /// Returns (private_scalar, uncompressed_public_point).
    pub fn generate_keypair(curve: &CurveParams) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        debug!("Generating {} keypair", curve.name);

        if curve.oid != ANSIX9P256R1.oid {
            return Err(CryptoError::UnsupportedCurve(curve.name));
        }

        let signing_key = P256SigningKey::random(&mut OsRng);
        let private_data = signing_key.to_bytes().to_vec();

        // Public key in uncompressed point format (0x04 || x || y)
        let point = signing_key.verifying_key().to_encoded_point(false);
        let public_data = point.as_bytes().to_vec();

        Ok((private_data, public_data))
    }

    /// Sign a precomputed digest with ECDSA, returning the DER encoding
    pub fn sign_prehash_der(
        curve: &CurveParams,
        private_key_bytes: &[u8],
        digest: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if curve.oid != ANSIX9P256R1.oid {
            return Err(CryptoError::UnsupportedCurve(curve.name));
        }
        if private_key_bytes.len() != curve.field_bytes() {
            return Err(CryptoError::InvalidKey(format!(
                "Invalid {} key length: expected {}, got {}",
                curve.name,
                curve.field_bytes(),
                private_key_bytes.len()
            )));
        }

        let signing_key = P256SigningKey::from_slice(private_key_bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        let signature: P256Signature = signing_key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;

        Ok(signature.to_der().as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::parse_der_ecdsa;
    use p256::ecdsa::signature::hazmat::PrehashVerifier;
    use p256::ecdsa::VerifyingKey;

    #[test]
    fn test_generate_p256_keypair() {
        let (private, public) = EccNistOperations::generate_keypair(&ANSIX9P256R1).unwrap();
        assert_eq!(private.len(), 32);
        assert_eq!(public.len(), 65);
        assert_eq!(public[0], 0x04); // Uncompressed point
    }

    #[test]
    fn test_sign_prehash_der_verifies() {
        let (private, public) = EccNistOperations::generate_keypair(&ANSIX9P256R1).unwrap();
        let digest = [0x5Au8; 32];
        let der = EccNistOperations::sign_prehash_der(&ANSIX9P256R1, &private, &digest).unwrap();
        assert_eq!(der[0], 0x30);

        let sig = parse_der_ecdsa(&der).unwrap();
        let fixed = sig.to_fixed_width(32).unwrap();
        let signature = P256Signature::from_slice(&fixed).unwrap();
        let verifying_key = VerifyingKey::from_sec1_bytes(&public).unwrap();
        verifying_key.verify_prehash(&digest, &signature).unwrap();
    }

    #[test]
    fn test_unsupported_curve() {
        let other = CurveParams {
            name: "brainpoolP256r1",
            oid: &[0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x07],
            bits: 256,
            field: &[],
            a: &[],
            b: &[],
            g: &[],
            order: &[],
            cofactor: 1,
        };
        assert_eq!(
            EccNistOperations::generate_keypair(&other),
            Err(CryptoError::UnsupportedCurve("brainpoolP256r1"))
        );
    }

    #[test]
    fn test_wrong_private_key_length() {
        assert!(matches!(
            EccNistOperations::sign_prehash_der(&ANSIX9P256R1, &[0x01; 31], &[0u8; 32]),
            Err(CryptoError::InvalidKey(_))
        ));
    }
}
