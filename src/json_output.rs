//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso da script
//! e da altri processi.
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout
//! - Riusa `ConversionResult` e `ConversionStats` senza duplicarne i campi
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch (input, target, numero file, converter)
//! - `file_complete`: Esito di un singolo file
//! - `no_files`: Directory senza file da convertire
//! - `complete`: Fine del batch con statistiche finali
//! - `error`: Errore fatale per il batch

use crate::config::Config;
use crate::progress::ConversionStats;
use crate::request::{ConversionResult, ConversionStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// Inizio del batch
    #[serde(rename = "start")]
    Start {
        input: PathBuf,
        output_target: PathBuf,
        total_files: usize,
        converter: PathBuf,
        config: JsonConfig,
    },

    /// Esito di un file
    #[serde(rename = "file_complete")]
    FileComplete {
        index: usize,
        total: usize,
        input_path: PathBuf,
        output_path: String,
        status: ConversionStatus,
        message: String,
    },

    /// Nessun file trovato
    #[serde(rename = "no_files")]
    NoFiles { input: PathBuf },

    /// Batch completato
    #[serde(rename = "complete")]
    Complete {
        completed: usize,
        already_processed: usize,
        skipped: usize,
        failed: usize,
        duration_seconds: f64,
    },

    /// Errore fatale
    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Parametri rilevanti riportati nel messaggio di start
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub min_file_size: u64,
    pub output_extension: String,
    pub workers: usize,
    pub dry_run: bool,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(
        input: PathBuf,
        output_target: PathBuf,
        total_files: usize,
        converter: PathBuf,
        config: JsonConfig,
    ) -> Self {
        Self::Start {
            input,
            output_target,
            total_files,
            converter,
            config,
        }
    }

    pub fn file_complete(result: &ConversionResult, index: usize, total: usize) -> Self {
        Self::FileComplete {
            index,
            total,
            input_path: result.input_path.clone(),
            output_path: result.output_path.clone(),
            status: result.status,
            message: result.message.clone(),
        }
    }

    pub fn no_files(input: PathBuf) -> Self {
        Self::NoFiles { input }
    }

    pub fn complete(stats: &ConversionStats, duration_seconds: f64) -> Self {
        Self::Complete {
            completed: stats.completed,
            already_processed: stats.already_processed,
            skipped: stats.skipped,
            failed: stats.failed,
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            min_file_size: config.min_file_size,
            output_extension: config.output_extension().to_string(),
            workers: config.workers,
            dry_run: config.dry_run,
        }
    }
}
