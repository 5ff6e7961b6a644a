//! Status Word (SW) constants for APDU responses
//!
//! ISO 7816-4 status words returned by the applet.

/// Status Word constants
pub struct SW;

impl SW {
    pub const SUCCESS: u16 = 0x9000;

    // Execution errors (65xx)
    pub const MEMORY_FAILURE: u16 = 0x6581;

    // Checking errors
    pub const WRONG_LENGTH: u16 = 0x6700;
    pub const CHAINING_ERROR: u16 = 0x6883;
    pub const CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
    pub const WRONG_DATA: u16 = 0x6A80;
    pub const FILE_NOT_FOUND: u16 = 0x6A82;
    pub const REFERENCED_DATA_NOT_FOUND: u16 = 0x6A88;
    pub const WRONG_P1_P2: u16 = 0x6B00;
    pub const INS_NOT_SUPPORTED: u16 = 0x6D00;
    pub const UNKNOWN_ERROR: u16 = 0x6F00;

    /// Create a "more data available" status word (61xx)
    ///
    /// The low byte reports the remaining byte count, capped at 0xFF.
    #[inline]
    pub fn bytes_remaining(remaining: usize) -> u16 {
        0x6100 | (remaining.min(0xFF) as u16)
    }

    /// Check if a status word indicates more data available (61xx)
    #[inline]
    pub fn is_more_data(sw: u16) -> bool {
        (sw & 0xFF00) == 0x6100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_remaining() {
        assert_eq!(SW::bytes_remaining(0), 0x6100);
        assert_eq!(SW::bytes_remaining(16), 0x6110);
        assert_eq!(SW::bytes_remaining(255), 0x61FF);
        assert_eq!(SW::bytes_remaining(256), 0x61FF);
        assert_eq!(SW::bytes_remaining(1000), 0x61FF);
    }

    #[test]
    fn test_is_more_data() {
        assert!(SW::is_more_data(0x6110));
        assert!(SW::is_more_data(0x61FF));
        assert!(!SW::is_more_data(0x9000));
        assert!(!SW::is_more_data(0x6883));
    }
}
