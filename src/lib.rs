//! # MDF Converter Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `request`: Richieste, risultati e report di batch
//! - `state`: Persistenza delle preferenze (path del converter)
//! - `platform`: Nome dell'eseguibile e directory di installazione per piattaforma
//! - `tool_resolver`: Ricerca e selezione del converter
//! - `converter_config`: File .ini letto dal converter
//! - `file_manager`: Discovery dei file di input
//! - `converter`: Orchestratore, engine per file e calcolo dei path
//! - `progress` / `json_output`: Progress bar, statistiche e output JSON
//!
//! ## Utilizzo:
//! ```ignore
//! use mdf_converter::{BatchOrchestrator, Config, ConversionRequest, ConverterLocator, OutputTarget};
//!
//! let config = Config::default();
//! let locator = ConverterLocator::from_config(&config);
//! let orchestrator = BatchOrchestrator::new(config, locator);
//! let request = ConversionRequest::new("/data", OutputTarget::Directory("/out".into()));
//! let report = orchestrator.run(request).await?;
//! ```

pub mod config;
pub mod converter;
pub mod converter_config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod platform;
pub mod progress;
pub mod request;
pub mod state;
pub mod tool_resolver;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use converter::{BatchOrchestrator, ConversionEngine, PathResolver};
pub use error::ConvertError;
pub use request::{BatchReport, ConversionRequest, ConversionResult, ConversionStatus, OutputTarget};
pub use state::{JsonPreferenceStore, PreferenceStore};
pub use tool_resolver::{ConverterBinary, ConverterLocator};
