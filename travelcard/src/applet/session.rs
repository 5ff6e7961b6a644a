//! Per-connection session state
//!
//! Nothing here is persisted. Selecting the applet starts a fresh session.
//!
//! The session holds the GET/PUT DATA occurrence cursor and the two
//! chaining buffers: the input buffer that reassembles a command body sent
//! across chained frames, and the output buffer holding response bytes not
//! yet fetched with GET RESPONSE. Only one of them carries live data at a
//! time: starting a command discards any unread output.

use log::{debug, warn};
use zeroize::Zeroize;

use crate::apdu::{Response, APDU};
use crate::error::CardError;

/// Largest response payload sent in one frame
pub const APDU_MAX_LENGTH: usize = 0x100;

/// Capacity of the reassembly and output buffers
pub const INTERNAL_BUFFER_MAX_LENGTH: usize = 0x500;

/// Cursor for repeated access to the same data object tag
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TagCursor {
    tag: u16,
    occurrence: u8,
}

impl TagCursor {
    /// Point the cursor at `tag`; a different tag restarts at occurrence 0
    pub fn select(&mut self, tag: u16) {
        if self.tag != tag {
            self.tag = tag;
            self.occurrence = 0;
        }
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    pub fn occurrence(&self) -> u8 {
        self.occurrence
    }

    /// Move to the next occurrence of the current tag
    pub fn advance(&mut self) {
        self.occurrence = self.occurrence.saturating_add(1);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Header of the frame that opened an input chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChainHeader {
    ins: u8,
    p1: u8,
    p2: u8,
}

impl ChainHeader {
    fn of(cmd: &APDU) -> Self {
        Self {
            ins: cmd.ins,
            p1: cmd.p1,
            p2: cmd.p2,
        }
    }
}

/// Transient state of one card session
#[derive(Default)]
pub struct Session {
    pub cursor: TagCursor,
    chain: Option<ChainHeader>,
    input: Vec<u8>,
    output: Vec<u8>,
    output_offset: usize,
    chaining_out: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, wiping both buffers
    pub fn clear(&mut self) {
        self.cursor.clear();
        self.abort_input();
        self.clear_output();
    }

    /// An input chain is open
    pub fn is_chaining_input(&self) -> bool {
        self.chain.is_some()
    }

    /// Response bytes are waiting for GET RESPONSE
    pub fn is_chaining_output(&self) -> bool {
        self.chaining_out
    }

    /// Unread response bytes
    pub fn output_remaining(&self) -> usize {
        self.output.len() - self.output_offset
    }

    /// Account for a new command frame before its data is received
    ///
    /// Pending output is discarded. A frame continuing an open chain must
    /// repeat the opening INS, P1 and P2; a mismatch aborts the chain.
    pub fn prepare_chaining_input(&mut self, cmd: &APDU) -> Result<(), CardError> {
        self.clear_output();

        match self.chain {
            Some(header) => {
                if header != ChainHeader::of(cmd) {
                    warn!(
                        "Chained frame INS={:02X} P1={:02X} P2={:02X} does not match chain INS={:02X} P1={:02X} P2={:02X}",
                        cmd.ins, cmd.p1, cmd.p2, header.ins, header.p1, header.p2
                    );
                    self.abort_input();
                    return Err(CardError::ChainingError);
                }
                if !cmd.is_chained() {
                    self.chain = None;
                }
            }
            None => {
                self.input.zeroize();
                if cmd.is_chained() {
                    debug!("Opening input chain for INS={:02X}", cmd.ins);
                    self.chain = Some(ChainHeader::of(cmd));
                }
            }
        }
        Ok(())
    }

    /// Append a frame's data to the reassembly buffer
    pub fn receive_data(&mut self, data: &[u8]) -> Result<(), CardError> {
        if self.input.len() + data.len() > INTERNAL_BUFFER_MAX_LENGTH {
            let total = self.input.len() + data.len();
            self.abort_input();
            return Err(CardError::MemoryFailure(format!(
                "command body of {} bytes exceeds {} byte buffer",
                total, INTERNAL_BUFFER_MAX_LENGTH
            )));
        }
        self.input.extend_from_slice(data);
        Ok(())
    }

    /// Hand over the reassembled command body
    pub fn take_input(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.input)
    }

    /// Close any input chain and wipe its data
    pub fn abort_input(&mut self) {
        self.chain = None;
        self.input.zeroize();
    }

    /// Queue a computed response for segmentation
    pub fn load_output(&mut self, mut data: Vec<u8>) -> Result<(), CardError> {
        self.clear_output();
        if data.len() > INTERNAL_BUFFER_MAX_LENGTH {
            let len = data.len();
            data.zeroize();
            return Err(CardError::MemoryFailure(format!(
                "response of {} bytes exceeds {} byte buffer",
                len, INTERNAL_BUFFER_MAX_LENGTH
            )));
        }
        self.output = data;
        Ok(())
    }

    /// Next response frame from the output buffer
    ///
    /// At most `min(le, APDU_MAX_LENGTH)` bytes are sent and wiped from the
    /// buffer. If bytes remain the status word is 61xx with the remaining
    /// count capped at 0xFF, otherwise 9000 and the output state is cleared.
    pub fn next_segment(&mut self, le: Option<u32>) -> Response {
        let available = self.output_remaining();
        let le = le.map_or(usize::MAX, |le| le as usize);
        let len = available.min(le).min(APDU_MAX_LENGTH);

        let start = self.output_offset;
        let chunk = self.output[start..start + len].to_vec();
        self.output[start..start + len].zeroize();
        self.output_offset += len;

        let remaining = available - len;
        if remaining > 0 {
            self.chaining_out = true;
            Response::more_data(chunk, remaining)
        } else {
            self.clear_output();
            Response::success(chunk)
        }
    }

    /// Drop unread output
    pub fn clear_output(&mut self) {
        self.output.zeroize();
        self.output_offset = 0;
        self.chaining_out = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::CLA_MASK_CHAINING;

    fn frame(chained: bool, p1: u8, data: &[u8]) -> APDU {
        let cla = if chained { CLA_MASK_CHAINING } else { 0x00 };
        APDU::with_data(cla, 0xDA, p1, 0x21, data.to_vec())
    }

    #[test]
    fn test_cursor() {
        let mut cursor = TagCursor::default();
        cursor.select(0x7F21);
        cursor.advance();
        assert_eq!(cursor.occurrence(), 1);

        cursor.select(0x7F21);
        assert_eq!(cursor.occurrence(), 1);

        cursor.select(0x006E);
        assert_eq!(cursor.tag(), 0x006E);
        assert_eq!(cursor.occurrence(), 0);
    }

    #[test]
    fn test_chain_reassembly() {
        let mut session = Session::new();
        for (i, byte) in [0x01u8, 0x02, 0x03].iter().enumerate() {
            let cmd = frame(i < 2, 0x7F, &[*byte]);
            session.prepare_chaining_input(&cmd).unwrap();
            session.receive_data(&cmd.data).unwrap();
            assert_eq!(session.is_chaining_input(), i < 2);
        }
        assert_eq!(session.take_input(), vec![0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_chain_mismatch_aborts() {
        let mut session = Session::new();
        let first = frame(true, 0x7F, &[0x01]);
        session.prepare_chaining_input(&first).unwrap();
        session.receive_data(&first.data).unwrap();

        let wrong = frame(false, 0x5F, &[0x02]);
        assert!(matches!(
            session.prepare_chaining_input(&wrong),
            Err(CardError::ChainingError)
        ));
        assert!(!session.is_chaining_input());
        assert!(session.take_input().is_empty());
    }

    #[test]
    fn test_receive_overflow() {
        let mut session = Session::new();
        let cmd = frame(true, 0x7F, &[0xAA; 0xFF]);
        for _ in 0..5 {
            session.prepare_chaining_input(&cmd).unwrap();
            session.receive_data(&cmd.data).unwrap();
        }
        session.prepare_chaining_input(&cmd).unwrap();
        assert!(matches!(
            session.receive_data(&cmd.data),
            Err(CardError::MemoryFailure(_))
        ));
        assert!(!session.is_chaining_input());
    }

    #[test]
    fn test_segmentation() {
        let mut session = Session::new();
        let data: Vec<u8> = (0..(3 * APDU_MAX_LENGTH + 5)).map(|i| i as u8).collect();
        session.load_output(data.clone()).unwrap();

        let mut collected = Vec::new();
        let first = session.next_segment(None);
        assert_eq!(first.sw(), 0x61FF);
        collected.extend(first.data);

        for expected_sw in [0x61FF, 0x6105, 0x9000] {
            assert!(session.is_chaining_output());
            let next = session.next_segment(Some(256));
            assert_eq!(next.sw(), expected_sw);
            collected.extend(next.data);
        }
        assert_eq!(collected, data);
        assert!(!session.is_chaining_output());
    }

    #[test]
    fn test_segment_honours_le() {
        let mut session = Session::new();
        session.load_output(vec![0x11; 40]).unwrap();

        let first = session.next_segment(Some(16));
        assert_eq!(first.data.len(), 16);
        assert_eq!(first.sw(), 0x6118);
        assert_eq!(session.output_remaining(), 24);
    }

    #[test]
    fn test_new_command_discards_output() {
        let mut session = Session::new();
        session.load_output(vec![0x22; 300]).unwrap();
        session.next_segment(None);
        assert!(session.is_chaining_output());

        session.prepare_chaining_input(&frame(false, 0x7F, &[])).unwrap();
        assert!(!session.is_chaining_output());
        assert_eq!(session.output_remaining(), 0);
    }

    #[test]
    fn test_load_output_too_large() {
        let mut session = Session::new();
        assert!(matches!(
            session.load_output(vec![0; INTERNAL_BUFFER_MAX_LENGTH + 1]),
            Err(CardError::MemoryFailure(_))
        ));
        assert_eq!(session.output_remaining(), 0);
    }
}
