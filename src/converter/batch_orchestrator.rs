//! # Batch Orchestrator
//!
//! Orchestratore principale che delega responsabilità ai moduli specializzati.
//!
//! ## Flusso di esecuzione:
//! 1. **Risoluzione input**: path assoluto, `PathNotFound` se inesistente
//! 2. **Discovery**: per una directory, enumera i file (ricorsivo se richiesto)
//!    e fissa `base_folder` alla root del walk
//! 3. **Converter**: risolto una sola volta, prima di qualsiasi lavoro parallelo
//! 4. **Configurazione**: file .ini scritto se assente (idempotente)
//! 5. **Processing**: un task per file, limitato da un semaforo (`workers`)
//! 6. **Report**: risultati raccolti nell'ordine di discovery
//!
//! Un errore su un file non interrompe mai il batch; solo `ConverterNotFound`
//! e `ConfigWriteFailed` sono fatali.

use crate::{
    config::Config,
    converter::{
        conversion_engine::ConversionEngine, path_resolver::PathResolver,
        progress_tracker::ProgressTracker,
    },
    converter_config,
    error::ConvertError,
    file_manager::{FileDiscovery, FileManager},
    json_output::{JsonConfig, JsonMessage},
    request::{BatchReport, ConversionRequest, ConversionResult},
    tool_resolver::{ConverterBinary, ConverterLocator},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

/// Orchestratore di un batch di conversione
pub struct BatchOrchestrator {
    config: Config,
    locator: ConverterLocator,
    resolver: PathResolver,
}

impl BatchOrchestrator {
    pub fn new(config: Config, locator: ConverterLocator) -> Self {
        let resolver = PathResolver::new(config.input_search_path.clone());
        Self {
            config,
            locator,
            resolver,
        }
    }

    /// Esegue il batch descritto da `request`
    pub async fn run(&self, request: ConversionRequest) -> Result<BatchReport, ConvertError> {
        let start_time = Instant::now();

        let input = self.resolver.resolve_absolute(&request.input_path, true)?;
        let request = ConversionRequest {
            input_path: input.clone(),
            ..request
        };

        let (files, request) = if input.is_dir() {
            // Gli output scritti accanto agli input non vanno riconvertiti
            let files = FileDiscovery::new(&input, &self.config.extension_filter, request.recursive)
                .excluding_extension(self.config.output_extension())
                .collect();
            if files.is_empty() {
                self.handle_empty_directory(&input);
                return Ok(BatchReport::no_files());
            }
            // base_folder resta fisso alla root per tutto il walk
            let request = request.with_base_folder(Some(input.clone()));
            (files, request)
        } else {
            if !FileManager::is_supported_format(&input) {
                let ext = FileManager::extension_lowercase(&input).unwrap_or_else(|| "(none)".to_string());
                let result = ConversionResult::failed(&input, None, ConvertError::InvalidExtension(ext).to_string());
                let mut report = BatchReport::default();
                report.push(result);
                return Ok(report);
            }
            (vec![input.clone()], request)
        };

        let converter = self.resolve_converter().await?;
        let config_file = converter_config::ensure_written(&self.config.converter_config_file())?;

        self.emit_start_message(&request, files.len(), &converter);

        let engine = ConversionEngine::new(self.config.clone(), Arc::new(converter), config_file);
        let tracker = ProgressTracker::new(files.len(), &self.config);
        let report = self.process_files(engine, &request, files, tracker.clone()).await;

        let stats = tracker.get_stats().await;
        tracker.finish(&stats.format_summary());
        if self.config.json_output {
            JsonMessage::complete(&stats, start_time.elapsed().as_secs_f64()).emit();
        } else {
            info!("=== Conversion Complete ===");
            info!("{}", stats.format_summary());
            info!("Elapsed: {:.1}s", start_time.elapsed().as_secs_f64());
        }

        Ok(report)
    }

    /// Risolve il converter una sola volta per batch
    pub async fn resolve_converter(&self) -> Result<ConverterBinary, ConvertError> {
        self.locator.locate(self.config.converter_path.as_deref()).await
    }

    /// Processa i file con concorrenza limitata, mantenendo l'ordine di discovery
    async fn process_files(
        &self,
        engine: ConversionEngine,
        request: &ConversionRequest,
        files: Vec<PathBuf>,
        tracker: ProgressTracker,
    ) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut tasks = Vec::with_capacity(files.len());

        for file in &files {
            // Il semaforo non viene mai chiuso: senza permesso si procede comunque
            let permit = semaphore.clone().acquire_owned().await.ok();
            let engine = engine.clone();
            let tracker = tracker.clone();
            let sub_request = request.for_file(file.clone());

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let result = engine.convert(&sub_request).await;
                tracker.handle_file_completion(&result).await;
                result
            }));
        }

        let outcomes = futures::future::join_all(tasks).await;

        let mut report = BatchReport::default();
        for (file, outcome) in files.iter().zip(outcomes) {
            match outcome {
                Ok(result) => report.push(result),
                Err(e) => {
                    error!("Conversion task failed for {}: {}", file.display(), e);
                    let result = ConversionResult::failed(file, None, format!("Conversion task failed: {}", e));
                    tracker.handle_file_completion(&result).await;
                    report.push(result);
                }
            }
        }
        report
    }

    fn handle_empty_directory(&self, input: &Path) {
        if self.config.json_output {
            JsonMessage::no_files(input.to_path_buf()).emit();
        } else {
            info!("No files found to convert in {}", input.display());
        }
    }

    fn emit_start_message(&self, request: &ConversionRequest, total: usize, converter: &ConverterBinary) {
        if self.config.json_output {
            JsonMessage::start(
                request.input_path.clone(),
                request.output_target.path().to_path_buf(),
                total,
                converter.path.clone(),
                JsonConfig::from(&self.config),
            )
            .emit();
            return;
        }

        info!("Starting conversion of {} file(s) from {}", total, request.input_path.display());
        info!("Output target: {}", request.output_target.path().display());
        info!(
            "Layout: {}",
            if request.structured_output { "structured" } else { "flat" }
        );
        if request.overwrite {
            info!("Overwrite mode: existing outputs are replaced");
        } else {
            info!("Skip mode: existing outputs are kept");
        }
        if self.config.dry_run {
            info!("Dry run mode: converter will not be invoked");
        }
        debug!("Converter: {:?}", converter);
    }
}
