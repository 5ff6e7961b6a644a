//! Card state data structures
//!
//! Everything here survives a power cycle; it is serialized to JSON by
//! [`super::CardDataStore`].

use serde::{Deserialize, Serialize};

use super::key::{CardKey, KeySlot};

/// Custom serde module for base64 encoding of byte vectors
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if bytes.is_empty() {
            serializer.serialize_str("")
        } else {
            serializer.serialize_str(&STANDARD.encode(bytes))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(Vec::new());
        }
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Number of key slots on the card
pub const KEY_SLOT_COUNT: usize = 1;

/// Largest value of the 3-byte digital signature counter
pub const SIGNATURE_COUNTER_MAX: u32 = 0x00FF_FFFF;

/// Complete persistent card state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardState {
    pub key_slots: [CardKey; KEY_SLOT_COUNT],

    /// Digital signature counter (3 bytes on the wire, saturating)
    pub signature_counter: u32,

    /// Card terminated (TERMINATE DF)
    pub terminated: bool,
}

impl Default for CardState {
    fn default() -> Self {
        Self {
            key_slots: [CardKey::default()],
            signature_counter: 0,
            terminated: false,
        }
    }
}

impl CardState {
    /// Restore install-time defaults
    pub fn reset(&mut self) {
        for key in self.key_slots.iter_mut() {
            key.reset();
        }
        self.signature_counter = 0;
        self.terminated = false;
    }

    pub fn key(&self, slot: KeySlot) -> &CardKey {
        &self.key_slots[slot.index()]
    }

    pub fn key_mut(&mut self, slot: KeySlot) -> &mut CardKey {
        &mut self.key_slots[slot.index()]
    }

    /// Increment the signature counter, saturating at 0xFFFFFF
    pub fn increment_signature_counter(&mut self) {
        if self.signature_counter < SIGNATURE_COUNTER_MAX {
            self.signature_counter += 1;
        }
    }

    /// Counter as the 3 big-endian bytes of DO 93
    pub fn signature_counter_bytes(&self) -> [u8; 3] {
        let ctr = self.signature_counter.min(SIGNATURE_COUNTER_MAX);
        [(ctr >> 16) as u8, (ctr >> 8) as u8, ctr as u8]
    }
}
