//! # Converter Module
//!
//! Modulo che separa le responsabilità della conversione in sottomoduli:
//! - `batch_orchestrator`: Orchestratore principale del batch
//! - `conversion_engine`: Worker per singoli file
//! - `progress_tracker`: Gestione progress unificata
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod batch_orchestrator;
pub mod conversion_engine;
pub mod path_resolver;
pub mod progress_tracker;

pub use batch_orchestrator::BatchOrchestrator;
pub use conversion_engine::ConversionEngine;
pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
