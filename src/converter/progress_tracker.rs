//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso tra i task del batch.
//! Gestisce sia output JSON che progress bar tradizionale.

use crate::{
    config::Config,
    json_output::JsonMessage,
    progress::{ConversionStats, ProgressManager},
    request::ConversionResult,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tracker progress unificato per un batch
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    json_output: bool,
    stats: Arc<Mutex<ConversionStats>>,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    /// Crea un nuovo tracker
    pub fn new(total_files: usize, config: &Config) -> Self {
        let progress_manager = if config.show_progress && !config.json_output {
            ProgressManager::new(total_files as u64)
        } else {
            ProgressManager::hidden()
        };

        Self {
            total_files,
            json_output: config.json_output,
            stats: Arc::new(Mutex::new(ConversionStats::new())),
            progress_manager,
        }
    }

    /// Registra l'esito di un file
    pub async fn handle_file_completion(&self, result: &ConversionResult) {
        let done = {
            let mut stats = self.stats.lock().await;
            stats.add(result.status);
            stats.total()
        };

        if self.json_output {
            JsonMessage::file_complete(result, done, self.total_files).emit();
        }

        let message = format!(
            "[{}] {}",
            result.status.label(),
            result.input_path.file_name().unwrap_or_default().to_string_lossy()
        );
        self.progress_manager.update(&message);
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        self.progress_manager.finish(summary);
    }

    /// Ottieni statistiche per report finale
    pub async fn get_stats(&self) -> ConversionStats {
        self.stats.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_tracker_counts_results() {
        let config = Config {
            show_progress: false,
            ..Default::default()
        };
        let tracker = ProgressTracker::new(2, &config);

        tracker
            .handle_file_completion(&ConversionResult::already_processed(Path::new("/a.mdf")))
            .await;
        tracker
            .handle_file_completion(&ConversionResult::failed(Path::new("/b.txt"), None, "x"))
            .await;

        let stats = tracker.get_stats().await;
        assert_eq!(stats.already_processed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total(), 2);
    }
}
