//! Card data structures and storage
//!
//! Persistent card state: the key slots, the signature counter and the
//! terminated flag, plus the JSON store that commits them atomically.

pub mod key;
pub mod state;
pub mod storage;

pub(crate) use state::base64_bytes;

pub use key::{AlgorithmID, CardKey, KeyAlgorithm, KeySlot};
pub use state::{CardState, SIGNATURE_COUNTER_MAX};
pub use storage::CardDataStore;
