//! APDU Response handling
//!
//! A Response carries the data bytes of one response frame plus SW1/SW2.

use super::status::SW;

/// One response frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response data (without status words)
    pub data: Vec<u8>,
    /// Status word 1 (SW1)
    pub sw1: u8,
    /// Status word 2 (SW2)
    pub sw2: u8,
}

impl Response {
    /// Create a new response with data and status word
    pub fn new(data: Vec<u8>, sw: u16) -> Self {
        Self {
            data,
            sw1: (sw >> 8) as u8,
            sw2: sw as u8,
        }
    }

    /// Create a success response (0x9000) with data
    pub fn success(data: Vec<u8>) -> Self {
        Self::new(data, SW::SUCCESS)
    }

    /// Create an empty success response (0x9000)
    pub fn ok() -> Self {
        Self::success(Vec::new())
    }

    /// Create an error response (no data)
    pub fn error(sw: u16) -> Self {
        Self::new(Vec::new(), sw)
    }

    /// Create a "more data available" response (0x61xx)
    pub fn more_data(data: Vec<u8>, remaining: usize) -> Self {
        Self::new(data, SW::bytes_remaining(remaining))
    }

    /// Get the combined status word as u16
    pub fn sw(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Convert to raw bytes for transmission (data + SW1 + SW2)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.data.len() + 2);
        result.extend_from_slice(&self.data);
        result.push(self.sw1);
        result.push(self.sw2);
        result
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

impl From<u16> for Response {
    /// Create an error response from a status word
    fn from(sw: u16) -> Self {
        Self::error(sw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let resp = Response::success(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(resp.sw(), 0x9000);
        assert_eq!(resp.to_bytes(), vec![0xDE, 0xAD, 0xBE, 0xEF, 0x90, 0x00]);
    }

    #[test]
    fn test_error_response() {
        let resp = Response::error(SW::CHAINING_ERROR);
        assert_eq!(resp.to_bytes(), vec![0x68, 0x83]);
    }

    #[test]
    fn test_more_data_response() {
        let resp = Response::more_data(vec![0xAB], 16);
        assert_eq!(resp.sw(), 0x6110);
        assert_eq!(resp.to_bytes(), vec![0xAB, 0x61, 0x10]);

        let capped = Response::more_data(Vec::new(), 700);
        assert_eq!(capped.sw(), 0x61FF);
    }

    #[test]
    fn test_from_sw() {
        let resp: Response = 0x6A88.into();
        assert_eq!(resp.sw(), SW::REFERENCED_DATA_NOT_FOUND);
        assert_eq!(Response::ok().to_bytes(), vec![0x90, 0x00]);
    }
}
