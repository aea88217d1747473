//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` enum per categorizzare tutti gli errori possibili
//! - Distingue errori per-file (recuperati in un `ConversionResult` fallito)
//!   da errori fatali per l'intero batch
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `PathNotFound`: path di input inesistente dopo la risoluzione
//! - `InvalidExtension`: estensione diversa da mdf/dat/xlg
//! - `ConverterNotFound`: nessun eseguibile del converter (fatale)
//! - `DeleteFailed`: impossibile eliminare un output esistente
//! - `TooSmall`: file sotto la soglia minima
//! - `InputUnreadable`: il converter non riesce ad aprire l'input
//! - `UnknownConversionFailure`: nessun output prodotto (o timeout)
//! - `ConfigWriteFailed`: impossibile scrivere il file .ini (fatale)
//!
//! ## Esempio:
//! ```ignore
//! if size < min {
//!     return Err(ConvertError::TooSmall { size, min });
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for batch conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Invalid file extension: {0}")]
    InvalidExtension(String),

    #[error("Converter not found: {0}")]
    ConverterNotFound(String),

    #[error("Unable to delete existing output {}: {source}", path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File too small ({size} bytes, minimum {min})")]
    TooSmall { size: u64, min: u64 },

    #[error("Converter cannot open input file: {}", .0.display())]
    InputUnreadable(PathBuf),

    #[error("Unknown conversion failure: {0}")]
    UnknownConversionFailure(String),

    #[error("Unable to write converter configuration {}: {source}", path.display())]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preference store error: {0}")]
    Preferences(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Errors after which no file of the batch can be converted.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConverterNotFound(_) | Self::ConfigWriteFailed { .. } | Self::PathNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_fatal_kinds() {
        assert!(ConvertError::ConverterNotFound("mdf2mat".into()).is_batch_fatal());
        assert!(ConvertError::ConfigWriteFailed {
            path: PathBuf::from("/x.ini"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .is_batch_fatal());
        assert!(!ConvertError::TooSmall { size: 10, min: 1024 }.is_batch_fatal());
        assert!(!ConvertError::InvalidExtension("txt".into()).is_batch_fatal());
    }

    #[test]
    fn test_too_small_message() {
        let err = ConvertError::TooSmall { size: 500, min: 1024 };
        assert!(err.to_string().starts_with("File too small"));
    }
}
