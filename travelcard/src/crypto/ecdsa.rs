//! ECDSA signature normalization
//!
//! Signing primitives emit `SEQUENCE { INTEGER r, INTEGER s }`. Hosts expect
//! the raw fixed-width `r || s`, so the DER form is parsed into its two
//! integers and re-encoded with each half left-padded to the field size.

use super::CryptoError;
use crate::tlv::{read_single, tags};

/// An ECDSA signature as two unsigned big-endian integers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcSignature {
    pub r: Vec<u8>,
    pub s: Vec<u8>,
}

impl EcSignature {
    /// Fixed-width `r || s` encoding for a curve with `field_bytes` sized elements
    pub fn to_fixed_width(&self, field_bytes: usize) -> Result<Vec<u8>, CryptoError> {
        encode_fixed_width(&self.r, &self.s, field_bytes)
    }
}

/// Parse a DER encoded ECDSA signature
///
/// Trailing bytes after the SEQUENCE are ignored. The sign octet of each
/// INTEGER is stripped so `r` and `s` hold only magnitude bytes.
pub fn parse_der_ecdsa(der: &[u8]) -> Result<EcSignature, CryptoError> {
    let (seq, _) = read_single(der, false).map_err(|_| CryptoError::MalformedSignature)?;
    if seq.tag != tags::DER_SEQUENCE as u32 {
        return Err(CryptoError::MalformedSignature);
    }

    let (r, rest) = read_integer(&seq.value)?;
    let (s, rest) = read_integer(rest)?;
    if !rest.is_empty() {
        return Err(CryptoError::MalformedSignature);
    }

    Ok(EcSignature { r, s })
}

fn read_integer(data: &[u8]) -> Result<(Vec<u8>, &[u8]), CryptoError> {
    let (int, rest) = read_single(data, false).map_err(|_| CryptoError::MalformedSignature)?;
    if int.tag != tags::DER_INTEGER as u32 || int.value.is_empty() {
        return Err(CryptoError::MalformedSignature);
    }
    // r and s are positive; a set high bit without a sign octet is negative
    if int.value[0] & 0x80 != 0 {
        return Err(CryptoError::MalformedSignature);
    }

    let leading_zeros = int.value.iter().take_while(|&&b| b == 0).count();
    Ok((int.value[leading_zeros..].to_vec(), rest))
}

/// Concatenate `r` and `s`, each left-padded with zeros to `field_bytes`
pub fn encode_fixed_width(r: &[u8], s: &[u8], field_bytes: usize) -> Result<Vec<u8>, CryptoError> {
    let mut out = vec![0u8; 2 * field_bytes];
    for (half, value) in [r, s].into_iter().enumerate() {
        let value = strip_leading_zeros(value);
        if value.len() > field_bytes {
            return Err(CryptoError::MalformedSignature);
        }
        let end = (half + 1) * field_bytes;
        out[end - value.len()..end].copy_from_slice(value);
    }
    Ok(out)
}

fn strip_leading_zeros(value: &[u8]) -> &[u8] {
    let zeros = value.iter().take_while(|&&b| b == 0).count();
    &value[zeros..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sign_octet_stripped() {
        // r = 00 80 01 (sign octet), s = 7F
        let der = hex::decode("3008020300800102017F").unwrap();
        let sig = parse_der_ecdsa(&der).unwrap();
        assert_eq!(sig.r, vec![0x80, 0x01]);
        assert_eq!(sig.s, vec![0x7F]);
    }

    #[test]
    fn test_parse_long_form_sequence() {
        let mut der = vec![0x30, 0x81, 0x86, 0x02, 0x41, 0x00];
        der.extend(vec![0xAB; 64]);
        der.extend([0x02, 0x41, 0x00]);
        der.extend(vec![0xCD; 64]);
        let sig = parse_der_ecdsa(&der).unwrap();
        assert_eq!(sig.r, vec![0xAB; 64]);
        assert_eq!(sig.s, vec![0xCD; 64]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_der_ecdsa(&[]), Err(CryptoError::MalformedSignature));
        assert_eq!(
            parse_der_ecdsa(&[0x31, 0x03, 0x02, 0x01, 0x01]),
            Err(CryptoError::MalformedSignature)
        );
        // only one INTEGER
        assert_eq!(
            parse_der_ecdsa(&[0x30, 0x03, 0x02, 0x01, 0x01]),
            Err(CryptoError::MalformedSignature)
        );
        // truncated
        assert_eq!(
            parse_der_ecdsa(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x05, 0x01]),
            Err(CryptoError::MalformedSignature)
        );
    }

    #[test]
    fn test_parse_rejects_negative_integer() {
        // r = 80 01 has no sign octet
        assert_eq!(
            parse_der_ecdsa(&hex::decode("300702028001020101").unwrap()),
            Err(CryptoError::MalformedSignature)
        );
        // s = FF
        assert_eq!(
            parse_der_ecdsa(&hex::decode("30060201010201FF").unwrap()),
            Err(CryptoError::MalformedSignature)
        );
    }

    #[test]
    fn test_encode_pads_short_halves() {
        let out = encode_fixed_width(&[0x01, 0x02], &[0xFF; 4], 4).unwrap();
        assert_eq!(out, vec![0x00, 0x00, 0x01, 0x02, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_rejects_oversized() {
        assert_eq!(
            encode_fixed_width(&[0x01; 5], &[0x01], 4),
            Err(CryptoError::MalformedSignature)
        );
        // a leading zero is not counted against the width
        assert!(encode_fixed_width(&[0x00, 0x01, 0x02, 0x03, 0x04], &[0x01], 4).is_ok());
    }

    #[test]
    fn test_der_to_fixed_width() {
        let mut der = vec![0x30, 0x44, 0x02, 0x1F];
        der.extend(vec![0x11; 31]);
        der.extend([0x02, 0x21, 0x00]);
        der.extend(vec![0x99; 32]);

        let fixed = parse_der_ecdsa(&der).unwrap().to_fixed_width(32).unwrap();
        assert_eq!(fixed.len(), 64);
        assert_eq!(fixed[0], 0x00);
        assert_eq!(&fixed[1..32], &[0x11; 31][..]);
        assert_eq!(&fixed[32..], &[0x99; 32][..]);
    }
}
