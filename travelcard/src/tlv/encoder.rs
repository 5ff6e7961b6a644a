//! BER-TLV Encoder
//!
//! Encodes TLV structures to bytes for card responses. Lengths always use
//! the shortest definite form.

/// Stateless BER-TLV encoder
pub struct TLVEncoder;

impl TLVEncoder {
    /// Encode one tag/value pair
    pub fn encode(tag: u32, value: &[u8]) -> Vec<u8> {
        let mut out = Self::encode_tag(tag);
        out.extend(Self::encode_length(value.len()));
        out.extend_from_slice(value);
        out
    }

    /// Tag bytes, big-endian, without leading zero octets
    pub fn encode_tag(tag: u32) -> Vec<u8> {
        let bytes = tag.to_be_bytes();
        let skip = bytes.iter().take(3).take_while(|&&b| b == 0).count();
        bytes[skip..].to_vec()
    }

    /// Definite length in its shortest form
    ///
    /// Below 0x80 the length is a single octet; otherwise `0x80 | n` is
    /// followed by the n significant length octets.
    pub fn encode_length(length: usize) -> Vec<u8> {
        if length < 0x80 {
            return vec![length as u8];
        }
        let bytes = (length as u64).to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        let mut out = Vec::with_capacity(1 + bytes.len() - skip);
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
        out
    }
}

/// Accumulates sibling TLVs and wraps them into templates
#[derive(Default)]
pub struct TLVBuilder {
    data: Vec<u8>,
}

impl TLVBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primitive tag/value pair
    pub fn add(mut self, tag: u32, value: &[u8]) -> Self {
        self.data.extend(TLVEncoder::encode(tag, value));
        self
    }

    /// Append bytes that are already TLV-encoded
    pub fn add_raw(mut self, encoded: &[u8]) -> Self {
        self.data.extend_from_slice(encoded);
        self
    }

    /// Turn everything added so far into the value of `tag`
    pub fn wrap(self, tag: u32) -> Self {
        Self {
            data: TLVEncoder::encode(tag, &self.data),
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::read_list;

    #[test]
    fn test_encode_simple() {
        let encoded = TLVEncoder::encode(0x8A, &[0x00]);
        assert_eq!(encoded, vec![0x8A, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_two_byte_tag() {
        let encoded = TLVEncoder::encode(0x7F21, &[0xCE; 3]);
        assert_eq!(encoded, vec![0x7F, 0x21, 0x03, 0xCE, 0xCE, 0xCE]);
    }

    #[test]
    fn test_encode_length_forms() {
        assert_eq!(TLVEncoder::encode_length(0), vec![0x00]);
        assert_eq!(TLVEncoder::encode_length(127), vec![0x7F]);
        assert_eq!(TLVEncoder::encode_length(128), vec![0x81, 0x80]);
        assert_eq!(TLVEncoder::encode_length(255), vec![0x81, 0xFF]);
        assert_eq!(TLVEncoder::encode_length(256), vec![0x82, 0x01, 0x00]);
        assert_eq!(TLVEncoder::encode_length(65535), vec![0x82, 0xFF, 0xFF]);
        assert_eq!(TLVEncoder::encode_length(0x10000), vec![0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_tag_widths() {
        assert_eq!(TLVEncoder::encode_tag(0x00), vec![0x00]);
        assert_eq!(TLVEncoder::encode_tag(0xC3), vec![0xC3]);
        assert_eq!(TLVEncoder::encode_tag(0x7F66), vec![0x7F, 0x66]);
        assert_eq!(TLVEncoder::encode_tag(0x5FC109), vec![0x5F, 0xC1, 0x09]);
    }

    #[test]
    fn test_builder_wraps_counter() {
        let data = TLVBuilder::new().add(0x93, &[0x00, 0x00, 0x2A]).wrap(0x7A).build();
        assert_eq!(data, vec![0x7A, 0x05, 0x93, 0x03, 0x00, 0x00, 0x2A]);

        let tlvs = read_list(&data, true);
        assert_eq!(tlvs[0].subs[0].tag, 0x93);
    }

    #[test]
    fn test_builder_long_modulus() {
        let modulus = vec![0xC3; 256];
        let data = TLVBuilder::new()
            .add(0x81, &modulus)
            .add(0x82, &[0x01, 0x00, 0x01])
            .wrap(0x7F49)
            .build();

        // 81 82 01 00 <256> 82 03 <3> = 265 bytes of content
        assert_eq!(&data[..5], &[0x7F, 0x49, 0x82, 0x01, 0x09]);
        assert_eq!(&data[5..9], &[0x81, 0x82, 0x01, 0x00]);
    }
}
