//! Card configuration
//!
//! Where the card keeps its state and which AID it answers to. Both can be
//! overridden from the environment.

use std::path::PathBuf;

use log::warn;

/// Environment variable naming the storage directory
pub const STORAGE_DIR_ENV: &str = "TRAVELCARD_STORAGE_DIR";

/// Environment variable carrying the AID as hex
pub const AID_ENV: &str = "TRAVELCARD_AID";

/// Proprietary AID: F0 "TRAVEL" 01
pub const DEFAULT_AID: [u8; 8] = [0xF0, 0x54, 0x52, 0x41, 0x56, 0x45, 0x4C, 0x01];

/// Card configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardConfig {
    /// Application identifier reported in DO 4F and matched on SELECT
    pub aid: Vec<u8>,
    /// State directory; `None` keeps state in memory only
    pub storage_dir: Option<PathBuf>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            aid: DEFAULT_AID.to_vec(),
            storage_dir: None,
        }
    }
}

impl CardConfig {
    /// Configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(STORAGE_DIR_ENV).ok(),
            std::env::var(AID_ENV).ok(),
        )
    }

    fn from_vars(storage_dir: Option<String>, aid: Option<String>) -> Self {
        let storage_dir = storage_dir
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_storage_dir);

        let aid = match aid {
            Some(value) => match hex::decode(value.trim()) {
                Ok(aid) if !aid.is_empty() && aid.len() <= 16 => aid,
                Ok(_) => {
                    warn!("{} must be 1 to 16 bytes, using default AID", AID_ENV);
                    DEFAULT_AID.to_vec()
                }
                Err(e) => {
                    warn!("Invalid {} ({}), using default AID", AID_ENV, e);
                    DEFAULT_AID.to_vec()
                }
            },
            None => DEFAULT_AID.to_vec(),
        };

        Self {
            aid,
            storage_dir: Some(storage_dir),
        }
    }

    /// Get the default storage directory
    fn default_storage_dir() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            return home.join(".travelcard");
        }
        PathBuf::from("/var/lib/travelcard")
    }

    /// Same configuration with state kept in `dir`
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }
}
