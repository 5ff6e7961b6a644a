//! Elliptic curve domain parameters
//!
//! A fixed table of named curves looked up by the raw OID bytes carried in
//! the key's algorithm attributes.

/// Domain parameters of a named curve over a prime field
#[derive(Debug, PartialEq, Eq)]
pub struct CurveParams {
    pub name: &'static str,
    /// DER content octets of the curve OID (no tag/length)
    pub oid: &'static [u8],
    /// Field size in bits
    pub bits: u16,
    pub field: &'static [u8],
    pub a: &'static [u8],
    pub b: &'static [u8],
    /// Generator, uncompressed SEC1 encoding
    pub g: &'static [u8],
    pub order: &'static [u8],
    pub cofactor: u8,
}

impl CurveParams {
    /// Byte length of one field element (and of r or s in a signature)
    pub fn field_bytes(&self) -> usize {
        (self.bits as usize + 7) / 8
    }

    /// Byte length of an uncompressed public point: 04 || x || y
    pub fn point_len(&self) -> usize {
        1 + 2 * self.field_bytes()
    }
}

/// ansix9p256r1 (NIST P-256, secp256r1)
pub static ANSIX9P256R1: CurveParams = CurveParams {
    name: "ansix9p256r1",
    oid: &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07],
    bits: 256,
    field: &[
        0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFF,
    ],
    a: &[
        0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFC,
    ],
    b: &[
        0x5A, 0xC6, 0x35, 0xD8, 0xAA, 0x3A, 0x93, 0xE7, 0xB3, 0xEB, 0xBD, 0x55, 0x76, 0x98, 0x86,
        0xBC, 0x65, 0x1D, 0x06, 0xB0, 0xCC, 0x53, 0xB0, 0xF6, 0x3B, 0xCE, 0x3C, 0x3E, 0x27, 0xD2,
        0x60, 0x4B,
    ],
    g: &[
        0x04, 0x6B, 0x17, 0xD1, 0xF2, 0xE1, 0x2C, 0x42, 0x47, 0xF8, 0xBC, 0xE6, 0xE5, 0x63, 0xA4,
        0x40, 0xF2, 0x77, 0x03, 0x7D, 0x81, 0x2D, 0xEB, 0x33, 0xA0, 0xF4, 0xA1, 0x39, 0x45, 0xD8,
        0x98, 0xC2, 0x96, 0x4F, 0xE3, 0x42, 0xE2, 0xFE, 0x1A, 0x7F, 0x9B, 0x8E, 0xE7, 0xEB, 0x4A,
        0x7C, 0x0F, 0x9E, 0x16, 0x2B, 0xCE, 0x33, 0x57, 0x6B, 0x31, 0x5E, 0xCE, 0xCB, 0xB6, 0x40,
        0x68, 0x37, 0xBF, 0x51, 0xF5,
    ],
    order: &[
        0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xBC, 0xE6, 0xFA, 0xAD, 0xA7, 0x17, 0x9E, 0x84, 0xF3, 0xB9, 0xCA, 0xC2, 0xFC, 0x63,
        0x25, 0x51,
    ],
    cofactor: 1,
};

/// Read-only lookup over a table of curves
#[derive(Debug, Clone, Copy)]
pub struct CurveRegistry {
    curves: &'static [&'static CurveParams],
}

static DEFAULT_CURVES: [&CurveParams; 1] = [&ANSIX9P256R1];

impl CurveRegistry {
    /// Registry over a custom table
    pub const fn new(curves: &'static [&'static CurveParams]) -> Self {
        Self { curves }
    }

    /// First curve whose OID bytes match exactly
    pub fn find_by_oid(&self, oid: &[u8]) -> Option<&'static CurveParams> {
        self.curves.iter().copied().find(|c| c.oid == oid)
    }
}

impl Default for CurveRegistry {
    fn default() -> Self {
        Self::new(&DEFAULT_CURVES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_p256() {
        let registry = CurveRegistry::default();
        let curve = registry
            .find_by_oid(&[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07])
            .unwrap();
        assert_eq!(curve.name, "ansix9p256r1");
        assert_eq!(curve.field_bytes(), 32);
        assert_eq!(curve.point_len(), 65);
    }

    #[test]
    fn test_prefix_does_not_match() {
        let registry = CurveRegistry::default();
        assert!(registry.find_by_oid(&[0x2A, 0x86, 0x48, 0xCE, 0x3D]).is_none());
        assert!(registry.find_by_oid(&[]).is_none());
    }

    #[test]
    fn test_p256_generator_on_curve_sizes() {
        assert_eq!(ANSIX9P256R1.g.len(), ANSIX9P256R1.point_len());
        assert_eq!(ANSIX9P256R1.field.len(), 32);
        assert_eq!(ANSIX9P256R1.order.len(), 32);
    }

    #[test]
    fn test_odd_bit_size_rounds_up() {
        static P521ISH: CurveParams = CurveParams {
            name: "test521",
            oid: &[0x2B, 0x81, 0x04, 0x00, 0x23],
            bits: 521,
            field: &[],
            a: &[],
            b: &[],
            g: &[],
            order: &[],
            cofactor: 1,
        };
        static TABLE: [&CurveParams; 1] = [&P521ISH];
        let registry = CurveRegistry::new(&TABLE);
        let curve = registry.find_by_oid(&[0x2B, 0x81, 0x04, 0x00, 0x23]).unwrap();
        assert_eq!(curve.field_bytes(), 66);
        assert_eq!(curve.point_len(), 133);
    }
}
