//! Card state storage
//!
//! Persistent JSON storage of the card state with all-or-nothing commits.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::state::CardState;
use crate::error::CardError;

/// Handles persistent storage of card state
pub struct CardDataStore {
    storage_dir: Option<PathBuf>,
    state: CardState,
}

impl CardDataStore {
    const DEFAULT_STATE_FILE: &'static str = "card_state.json";
    const TEMP_STATE_FILE: &'static str = "card_state.json.tmp";

    /// Create a store backed by `storage_dir`
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            storage_dir: Some(storage_dir),
            state: CardState::default(),
        }
    }

    /// Create a store that never touches the filesystem
    pub fn volatile() -> Self {
        Self {
            storage_dir: None,
            state: CardState::default(),
        }
    }

    /// Path of the JSON state file, if persistent
    pub fn state_file(&self) -> Option<PathBuf> {
        self.storage_dir
            .as_ref()
            .map(|dir| dir.join(Self::DEFAULT_STATE_FILE))
    }

    /// Ensure the storage directory exists
    fn ensure_storage_dir(dir: &Path) -> std::io::Result<()> {
        fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o700));
        }
        Ok(())
    }

    /// Load card state from storage
    ///
    /// Returns true if state was loaded, false if defaults are in use
    pub fn load(&mut self) -> bool {
        let Some(state_file) = self.state_file() else {
            self.state = CardState::default();
            return false;
        };

        if !state_file.exists() {
            info!("No existing card state, creating new");
            self.state = CardState::default();
            return false;
        }

        match fs::read_to_string(&state_file) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => {
                    self.state = state;
                    info!("Loaded card state from {:?}", state_file);
                    true
                }
                Err(e) => {
                    warn!("Failed to parse card state: {}", e);
                    self.state = CardState::default();
                    false
                }
            },
            Err(e) => {
                warn!("Failed to read card state file: {}", e);
                self.state = CardState::default();
                false
            }
        }
    }

    /// Write `state` to a temporary file, then rename it over the state file
    fn write_state(&self, state: &CardState) -> Result<(), CardError> {
        let Some(dir) = &self.storage_dir else {
            return Ok(());
        };

        let io_err = |e: std::io::Error| {
            warn!("Failed to write card state: {}", e);
            CardError::MemoryFailure(e.to_string())
        };

        Self::ensure_storage_dir(dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(state).map_err(|e| {
            warn!("Failed to serialize card state: {}", e);
            CardError::MemoryFailure(e.to_string())
        })?;

        let temp_file = dir.join(Self::TEMP_STATE_FILE);
        let state_file = dir.join(Self::DEFAULT_STATE_FILE);

        let mut file = fs::File::create(&temp_file).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&temp_file, fs::Permissions::from_mode(0o600));
        }

        fs::rename(&temp_file, &state_file).map_err(io_err)?;
        debug!("Saved card state to {:?}", state_file);
        Ok(())
    }

    /// Run `f` against a working copy of the state and commit it
    ///
    /// Either every change made by `f` is persisted and becomes visible, or
    /// none is: an error from `f` or from the write leaves the live state
    /// and the file untouched.
    pub fn atomic<T, F>(&mut self, f: F) -> Result<T, CardError>
    where
        F: FnOnce(&mut CardState) -> Result<T, CardError>,
    {
        let mut working = self.state.clone();
        let value = f(&mut working)?;
        self.write_state(&working)?;
        self.state = working;
        Ok(value)
    }

    /// Reset card to factory defaults
    pub fn factory_reset(&mut self) -> Result<(), CardError> {
        self.atomic(|state| {
            state.reset();
            Ok(())
        })?;
        info!("Card reset to factory defaults");
        Ok(())
    }

    /// Get a reference to the current card state
    pub fn state(&self) -> &CardState {
        &self.state
    }
}
