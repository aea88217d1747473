//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di conversione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `converter_path`: Path esplicito del converter (default: None = discovery)
//! - `converter_config_path`: File .ini passato al converter (default: `~/.mdf-converter/mdf2mat.ini`)
//! - `preferences_path`: Store delle preferenze (default: `~/.mdf-converter/preferences.json`)
//! - `search_dirs`: Directory di installazione aggiuntive da scansionare
//! - `input_search_path`: Directory in cui cercare input indicati con il solo nome
//! - `extension_filter`: Filtro estensioni per la discovery (default: vuoto = tutti i file)
//! - `output_extension`: Estensione dei file prodotti (default: "mat")
//! - `min_file_size`: Dimensione minima di un input convertibile (default: 1024 bytes)
//! - `converter_timeout_secs`: Timeout per ogni invocazione del converter (default: 600)
//! - `probe_timeout_secs`: Timeout per la lettura della versione (default: 10)
//! - `version_flag`: Flag passato al converter per stampare la versione (default: "-h")
//! - `workers`: Numero di conversioni parallele (default: 1)
//! - `dry_run`: Simulazione senza invocare il converter (default: false)
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     workers: 4,
//!     min_file_size: 2048,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Directory name under the home directory holding preferences and the converter .ini
pub const STATE_DIR_NAME: &str = ".mdf-converter";

/// Configuration for batch conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit converter executable (takes precedence over the preference store)
    pub converter_path: Option<PathBuf>,
    /// Location of the converter configuration file
    pub converter_config_path: Option<PathBuf>,
    /// Location of the persisted converter preference
    pub preferences_path: Option<PathBuf>,
    /// Extra installation directories scanned before the platform defaults
    pub search_dirs: Vec<PathBuf>,
    /// Directories searched for bare input file names
    pub input_search_path: Vec<PathBuf>,
    /// Extensions accepted by discovery (empty = every regular file)
    pub extension_filter: Vec<String>,
    /// Extension appended to produced files
    pub output_extension: String,
    /// Inputs below this size are rejected without invoking the converter
    pub min_file_size: u64,
    /// Timeout for a single conversion
    pub converter_timeout_secs: u64,
    /// Timeout for a version probe
    pub probe_timeout_secs: u64,
    /// Flag making the converter print its version banner
    pub version_flag: String,
    /// Number of parallel conversions
    pub workers: usize,
    /// Dry run - never delete outputs nor invoke the converter
    pub dry_run: bool,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
    /// Show the progress bar
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            converter_path: None,
            converter_config_path: None,
            preferences_path: None,
            search_dirs: Vec::new(),
            input_search_path: Vec::new(),
            extension_filter: Vec::new(),
            output_extension: "mat".to_string(),
            min_file_size: 1024,
            converter_timeout_secs: 600,
            probe_timeout_secs: 10,
            version_flag: "-h".to_string(),
            workers: 1,
            dry_run: false,
            json_output: false,
            show_progress: true,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.converter_timeout_secs == 0 || self.probe_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Timeouts must be greater than 0 seconds"));
        }

        let ext = self.output_extension.trim_start_matches('.');
        if ext.is_empty() {
            return Err(anyhow::anyhow!("Output extension must not be empty"));
        }

        Ok(())
    }

    /// Output extension without a leading dot
    pub fn output_extension(&self) -> &str {
        self.output_extension.trim_start_matches('.')
    }

    pub fn converter_timeout(&self) -> Duration {
        Duration::from_secs(self.converter_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Directory holding the default preference store and converter .ini
    pub fn state_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(STATE_DIR_NAME)
    }

    /// Resolved location of the converter configuration file
    pub fn converter_config_file(&self) -> PathBuf {
        self.converter_config_path
            .clone()
            .unwrap_or_else(|| Self::state_dir().join(crate::converter_config::CONFIG_FILE_NAME))
    }

    /// Resolved location of the preference store
    pub fn preferences_file(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("preferences.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
