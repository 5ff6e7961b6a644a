//! Card error type
//!
//! Every command handler returns `Result<_, CardError>`. The dispatcher in
//! [`crate::applet`] is the only place these are turned into status words.

use thiserror::Error;

use crate::apdu::SW;
use crate::crypto::CryptoError;

/// Errors raised while processing a command
#[derive(Debug, Error)]
pub enum CardError {
    #[error("wrong length")]
    WrongLength,

    #[error("wrong data")]
    WrongData,

    #[error("incorrect P1/P2")]
    WrongP1P2,

    #[error("instruction {0:#04x} not supported")]
    InsNotSupported(u8),

    #[error("conditions of use not satisfied")]
    ConditionsNotSatisfied,

    #[error("referenced data not found")]
    ReferenceDataNotFound,

    #[error("command chaining error")]
    ChainingError,

    #[error("file or application not found")]
    FileNotFound,

    #[error("persistent storage failure: {0}")]
    MemoryFailure(String),

    #[error("crypto failure: {0}")]
    Crypto(#[from] CryptoError),
}

impl CardError {
    /// Status word reported to the host for this error
    pub fn status_word(&self) -> u16 {
        match self {
            CardError::WrongLength => SW::WRONG_LENGTH,
            CardError::WrongData => SW::WRONG_DATA,
            CardError::WrongP1P2 => SW::WRONG_P1_P2,
            CardError::InsNotSupported(_) => SW::INS_NOT_SUPPORTED,
            CardError::ConditionsNotSatisfied => SW::CONDITIONS_NOT_SATISFIED,
            CardError::ReferenceDataNotFound => SW::REFERENCED_DATA_NOT_FOUND,
            CardError::ChainingError => SW::CHAINING_ERROR,
            CardError::FileNotFound => SW::FILE_NOT_FOUND,
            CardError::MemoryFailure(_) => SW::MEMORY_FAILURE,
            CardError::Crypto(_) => SW::UNKNOWN_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_words() {
        assert_eq!(CardError::WrongLength.status_word(), 0x6700);
        assert_eq!(CardError::ChainingError.status_word(), 0x6883);
        assert_eq!(CardError::ReferenceDataNotFound.status_word(), 0x6A88);
        assert_eq!(CardError::InsNotSupported(0x20).status_word(), 0x6D00);
        assert_eq!(
            CardError::MemoryFailure("disk full".into()).status_word(),
            0x6581
        );
    }

    #[test]
    fn test_crypto_error_maps_to_unknown() {
        let err: CardError = CryptoError::Signing("bad key".into()).into();
        assert_eq!(err.status_word(), 0x6F00);
    }
}
