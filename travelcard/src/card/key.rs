//! Key material manager
//!
//! A [`CardKey`] owns one slot's algorithm attributes, its optional key
//! pair and the certificate attesting that key pair. Whenever the key pair
//! changes the certificate is dropped with it.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::state::base64_bytes;
use crate::crypto::{
    parse_der_ecdsa, CryptoBackend, CurveParams, CurveRegistry, DigestAlgorithm, KeyPair,
    RsaOperations,
};
use crate::error::CardError;
use crate::tlv::{tags, TLVBuilder};

/// Maximum stored certificate length
pub const CERTIFICATE_MAX_LENGTH: usize = 0x480;

/// Algorithm attribute length bounds
pub const ATTRIBUTES_MIN_LENGTH: usize = 6;
pub const ATTRIBUTES_MAX_LENGTH: usize = 13;

/// RSA 2048, 17 bit exponent, CRT with modulus
pub const DEFAULT_ATTRIBUTES: [u8; 6] = [0x01, 0x08, 0x00, 0x00, 0x11, 0x03];

/// Algorithm IDs (first attribute byte)
pub struct AlgorithmID;

impl AlgorithmID {
    pub const RSA: u8 = 0x01;
    pub const ECDH: u8 = 0x12;
    pub const ECDSA: u8 = 0x13;
}

/// Marks an OID that is followed by an import-format byte
const OID_TRAILER: u8 = 0xFF;

const RSA_MIN_MODULUS_BITS: u16 = 2048;
/// Largest modulus whose 7F49 template still fits the output buffer
const RSA_MAX_MODULUS_BITS: u16 = 4096;
const RSA_EXPONENT_BITS: u16 = 0x11;
const RSA_MAX_FORMAT: u8 = 3;

/// Key slots addressed by the applet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySlot {
    Authentication,
}

impl KeySlot {
    /// Slot addressed by the data object occurrence counter
    pub fn from_occurrence(occurrence: u8) -> Option<Self> {
        match occurrence {
            0 => Some(KeySlot::Authentication),
            _ => None,
        }
    }

    /// Slot named by a control reference template
    pub fn from_crt(crt: u16) -> Option<Self> {
        match crt {
            tags::CRT_AUTHENTICATION_KEY => Some(KeySlot::Authentication),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            KeySlot::Authentication => 0,
        }
    }
}

/// Parsed view of a slot's algorithm attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm<'a> {
    Rsa {
        modulus_bits: u16,
        exponent_bits: u16,
        format: u8,
    },
    Ec {
        oid: &'a [u8],
    },
}

impl<'a> KeyAlgorithm<'a> {
    /// Decode attribute bytes without validating them
    pub fn parse(attributes: &'a [u8]) -> Option<Self> {
        match *attributes.first()? {
            AlgorithmID::RSA if attributes.len() >= ATTRIBUTES_MIN_LENGTH => Some(KeyAlgorithm::Rsa {
                modulus_bits: u16::from_be_bytes([attributes[1], attributes[2]]),
                exponent_bits: u16::from_be_bytes([attributes[3], attributes[4]]),
                format: attributes[5],
            }),
            AlgorithmID::ECDH | AlgorithmID::ECDSA => {
                let oid = &attributes[1..];
                let oid = match oid.split_last() {
                    Some((&OID_TRAILER, head)) => head,
                    _ => oid,
                };
                Some(KeyAlgorithm::Ec { oid })
            }
            _ => None,
        }
    }
}

/// One key slot
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct CardKey {
    #[serde(with = "base64_bytes")]
    certificate: Vec<u8>,
    #[serde(with = "base64_bytes")]
    attributes: Vec<u8>,
    key_pair: Option<KeyPair>,
}

impl Default for CardKey {
    fn default() -> Self {
        Self {
            certificate: Vec::new(),
            attributes: DEFAULT_ATTRIBUTES.to_vec(),
            key_pair: None,
        }
    }
}

impl std::fmt::Debug for CardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardKey")
            .field("certificate_len", &self.certificate.len())
            .field("attributes", &hex::encode(&self.attributes))
            .field("key_pair", &self.key_pair)
            .finish()
    }
}

impl CardKey {
    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    pub fn attributes(&self) -> &[u8] {
        &self.attributes
    }

    pub fn key_pair(&self) -> Option<&KeyPair> {
        self.key_pair.as_ref()
    }

    /// Back to default attributes with no key and no certificate
    pub fn reset(&mut self) {
        self.clear_key_pair();
        self.attributes.zeroize();
        self.attributes = DEFAULT_ATTRIBUTES.to_vec();
    }

    /// Drop the key pair together with the certificate that attests it
    fn clear_key_pair(&mut self) {
        self.key_pair = None;
        self.certificate.zeroize();
    }

    /// Key pair present with both halves populated
    pub fn is_initialized(&self) -> bool {
        self.key_pair.as_ref().map_or(false, KeyPair::is_initialized)
    }

    pub fn set_certificate(&mut self, certificate: &[u8]) -> Result<(), CardError> {
        if certificate.len() > CERTIFICATE_MAX_LENGTH {
            return Err(CardError::WrongLength);
        }
        self.certificate.zeroize();
        self.certificate = certificate.to_vec();
        Ok(())
    }

    /// Validate and store new algorithm attributes
    ///
    /// On success any existing key pair and certificate are cleared.
    pub fn set_attributes(&mut self, requested: &[u8], registry: &CurveRegistry) -> Result<(), CardError> {
        if requested.len() < ATTRIBUTES_MIN_LENGTH || requested.len() > ATTRIBUTES_MAX_LENGTH {
            return Err(CardError::WrongLength);
        }

        match KeyAlgorithm::parse(requested) {
            Some(KeyAlgorithm::Rsa {
                modulus_bits,
                exponent_bits,
                format,
            }) => {
                if !(RSA_MIN_MODULUS_BITS..=RSA_MAX_MODULUS_BITS).contains(&modulus_bits)
                    || exponent_bits != RSA_EXPONENT_BITS
                    || format > RSA_MAX_FORMAT
                {
                    return Err(CardError::WrongData);
                }
            }
            Some(KeyAlgorithm::Ec { oid }) => {
                if registry.find_by_oid(oid).is_none() {
                    return Err(CardError::WrongData);
                }
            }
            None => return Err(CardError::ConditionsNotSatisfied),
        }

        self.clear_key_pair();
        self.attributes.zeroize();
        self.attributes = requested.to_vec();
        debug!("Algorithm attributes set to {}", hex::encode(requested));
        Ok(())
    }

    pub fn algorithm(&self) -> Option<KeyAlgorithm<'_>> {
        KeyAlgorithm::parse(&self.attributes)
    }

    pub fn is_rsa(&self) -> bool {
        matches!(self.algorithm(), Some(KeyAlgorithm::Rsa { .. }))
    }

    pub fn is_ec(&self) -> bool {
        matches!(self.algorithm(), Some(KeyAlgorithm::Ec { .. }))
    }

    /// Modulus size in bits, if this is an RSA slot
    pub fn rsa_modulus_bits(&self) -> Option<u16> {
        match self.algorithm()? {
            KeyAlgorithm::Rsa { modulus_bits, .. } => Some(modulus_bits),
            KeyAlgorithm::Ec { .. } => None,
        }
    }

    /// Curve domain parameters, if this is an EC slot on a known curve
    pub fn ec_params(&self, registry: &CurveRegistry) -> Option<&'static CurveParams> {
        match self.algorithm()? {
            KeyAlgorithm::Ec { oid } => registry.find_by_oid(oid),
            KeyAlgorithm::Rsa { .. } => None,
        }
    }

    /// Generate a new key pair for the stored attributes
    ///
    /// The previous key pair and certificate are replaced only when
    /// generation succeeds.
    pub fn generate<B: CryptoBackend + ?Sized>(
        &mut self,
        backend: &B,
        registry: &CurveRegistry,
    ) -> Result<(), CardError> {
        let generated = match self.algorithm() {
            Some(KeyAlgorithm::Rsa { modulus_bits, .. }) => {
                if !(RSA_MIN_MODULUS_BITS..=RSA_MAX_MODULUS_BITS).contains(&modulus_bits) {
                    return Err(CardError::ConditionsNotSatisfied);
                }
                backend.generate_rsa(modulus_bits as usize)
            }
            Some(KeyAlgorithm::Ec { .. }) => {
                let params = self
                    .ec_params(registry)
                    .ok_or(CardError::ConditionsNotSatisfied)?;
                backend.generate_ec(params)
            }
            None => return Err(CardError::ConditionsNotSatisfied),
        };

        let key_pair = generated.map_err(|e| {
            warn!("Key generation failed: {}", e);
            CardError::ConditionsNotSatisfied
        })?;

        if !key_pair.is_initialized() {
            warn!("Key generation produced an incomplete key pair");
            return Err(CardError::ConditionsNotSatisfied);
        }

        self.clear_key_pair();
        self.key_pair = Some(key_pair);
        info!("Generated key pair for attributes {}", hex::encode(&self.attributes));
        Ok(())
    }

    /// Public key data object (7F49)
    pub fn export_public_key(&self) -> Result<Vec<u8>, CardError> {
        let key_pair = match &self.key_pair {
            Some(key_pair) if key_pair.is_initialized() => key_pair,
            _ => return Err(CardError::ReferenceDataNotFound),
        };

        let builder = match self.algorithm() {
            Some(KeyAlgorithm::Rsa { .. }) => {
                let modulus = RsaOperations::get_modulus(&key_pair.public_key)
                    .ok_or(CardError::ConditionsNotSatisfied)?;
                let exponent = RsaOperations::get_exponent(&key_pair.public_key)
                    .ok_or(CardError::ConditionsNotSatisfied)?;
                TLVBuilder::new()
                    .add(tags::RSA_MODULUS as u32, &modulus)
                    .add(tags::RSA_EXPONENT as u32, &exponent)
            }
            Some(KeyAlgorithm::Ec { .. }) => {
                TLVBuilder::new().add(tags::ECC_PUBLIC_KEY as u32, &key_pair.public_key)
            }
            None => return Err(CardError::ConditionsNotSatisfied),
        };

        Ok(builder.wrap(tags::PUBLIC_KEY_TEMPLATE as u32).build())
    }

    /// Sign a host-computed digest
    ///
    /// RSA returns a PKCS#1 v1.5 signature as long as the modulus. EC
    /// returns fixed-width `r || s`.
    pub fn sign<B: CryptoBackend + ?Sized>(
        &self,
        backend: &B,
        registry: &CurveRegistry,
        digest: &[u8],
    ) -> Result<Vec<u8>, CardError> {
        let key_pair = match &self.key_pair {
            Some(key_pair) if key_pair.is_initialized() => key_pair,
            _ => return Err(CardError::ReferenceDataNotFound),
        };

        match self.algorithm() {
            Some(KeyAlgorithm::Rsa { modulus_bits, .. }) => {
                let modulus_bytes = (modulus_bits as usize + 7) / 8;
                if digest.len() > (modulus_bytes * 2) / 5 {
                    return Err(CardError::ConditionsNotSatisfied);
                }
                let algorithm = DigestAlgorithm::from_digest_len(digest.len())
                    .ok_or(CardError::ConditionsNotSatisfied)?;

                Ok(backend.sign_rsa_pkcs1(&key_pair.private_key, algorithm, digest)?)
            }
            Some(KeyAlgorithm::Ec { .. }) => {
                DigestAlgorithm::from_digest_len(digest.len())
                    .ok_or(CardError::ConditionsNotSatisfied)?;
                let params = self
                    .ec_params(registry)
                    .ok_or(CardError::ConditionsNotSatisfied)?;

                let der = backend.sign_ecdsa_der(&key_pair.private_key, params, digest)?;
                parse_der_ecdsa(&der)
                    .and_then(|sig| sig.to_fixed_width(params.field_bytes()))
                    .map_err(|_| CardError::WrongData)
            }
            None => Err(CardError::ConditionsNotSatisfied),
        }
    }
}
