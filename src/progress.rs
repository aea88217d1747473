//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche del batch.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce la progress bar principale (`indicatif`)
//! - `ConversionStats`: Conteggi cumulativi per stato di conversione
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 12/20 (60%) [OK] trace_017.mdf
//! ```

use crate::request::ConversionStatus;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for a batch
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A manager that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for conversion results
#[derive(Debug, Default, Clone)]
pub struct ConversionStats {
    pub completed: usize,
    pub already_processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, status: ConversionStatus) {
        match status {
            ConversionStatus::Completed => self.completed += 1,
            ConversionStatus::AlreadyProcessed => self.already_processed += 1,
            ConversionStatus::Skipped => self.skipped += 1,
            ConversionStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.already_processed + self.skipped + self.failed
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Completed: {} | Already processed: {} | Skipped: {} | Failed: {}",
            self.total(),
            self.completed,
            self.already_processed,
            self.skipped,
            self.failed
        )
    }
}
