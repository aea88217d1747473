//! # State Management Module
//!
//! Questo modulo persiste la posizione del converter risolta, così le
//! esecuzioni successive non devono ripetere la scansione delle directory.
//!
//! ## Responsabilità:
//! - Mapping persistente chiave -> path (`PreferenceStore`)
//! - Lettura all'avvio, scrittura dopo una (ri)scoperta riuscita
//! - Implementazione JSON su disco e implementazione in memoria per i test
//!
//! ## Esempio struttura file:
//! ```json
//! {
//!   "entries": {
//!     "converter_path": "/opt/mdf2mat/mdf2mat"
//!   }
//! }
//! ```

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key under which the resolved converter location is stored
pub const CONVERTER_PATH_KEY: &str = "converter_path";

/// Persisted key -> path mapping
pub trait PreferenceStore: Send + Sync {
    fn load(&self, key: &str) -> Option<PathBuf>;
    fn store(&self, key: &str, path: &Path) -> Result<(), ConvertError>;
}

/// On-disk content of the preference store
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StateFile {
    pub entries: HashMap<String, PathBuf>,
}

/// JSON preference store
pub struct JsonPreferenceStore {
    state_file_path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(state_file_path: PathBuf) -> Self {
        Self { state_file_path }
    }

    pub fn path(&self) -> &Path {
        &self.state_file_path
    }

    fn read(&self) -> StateFile {
        match std::fs::read_to_string(&self.state_file_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(
                    "Ignoring corrupt preference file {}: {}",
                    self.state_file_path.display(),
                    e
                );
                StateFile::default()
            }),
            Err(_) => StateFile::default(),
        }
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load(&self, key: &str) -> Option<PathBuf> {
        let value = self.read().entries.remove(key);
        debug!("Preference {} -> {:?}", key, value);
        value
    }

    fn store(&self, key: &str, path: &Path) -> Result<(), ConvertError> {
        let mut state = self.read();
        state.entries.insert(key.to_string(), path.to_path_buf());

        if let Some(parent) = self.state_file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&state)
            .map_err(|e| ConvertError::Preferences(e.to_string()))?;
        std::fs::write(&self.state_file_path, content)?;
        Ok(())
    }
}

/// Volatile preference store
#[derive(Default)]
pub struct MemoryPreferenceStore {
    entries: Mutex<HashMap<String, PathBuf>>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Option<PathBuf> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn store(&self, key: &str, path: &Path) -> Result<(), ConvertError> {
        self.entries
            .lock()
            .map_err(|e| ConvertError::Preferences(e.to_string()))?
            .insert(key.to_string(), path.to_path_buf());
        Ok(())
    }
}
