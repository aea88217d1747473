//! # Request and Result Types
//!
//! Tipi immutabili che attraversano la pipeline di conversione:
//! - `ConversionRequest`: cosa convertire e con quale politica di output
//! - `ConversionResult`: esito di un singolo file
//! - `BatchReport`: sequenza ordinata dei risultati di un batch

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Where converted files go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputTarget {
    /// Outputs are written inside this directory
    Directory(PathBuf),
    /// A single output file, used verbatim
    File(PathBuf),
}

impl OutputTarget {
    /// Classify a user-supplied output path.
    ///
    /// Existing directories, paths ending with a separator and paths without
    /// an extension are directories; anything else is a file.
    pub fn classify(path: &Path) -> Self {
        let raw = path.to_string_lossy();
        if path.is_dir()
            || raw.ends_with(MAIN_SEPARATOR)
            || raw.ends_with('/')
            || path.extension().is_none()
        {
            Self::Directory(path.to_path_buf())
        } else {
            Self::File(path.to_path_buf())
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(p) | Self::File(p) => p,
        }
    }
}

/// One conversion job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_target: OutputTarget,
    pub overwrite: bool,
    pub structured_output: bool,
    pub recursive: bool,
    /// Root of the structured-output remapping, fixed at the top of a walk
    pub base_folder: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<PathBuf>, output_target: OutputTarget) -> Self {
        Self {
            input_path: input_path.into(),
            output_target,
            overwrite: false,
            structured_output: false,
            recursive: false,
            base_folder: None,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_structured_output(mut self, structured: bool) -> Self {
        self.structured_output = structured;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_base_folder(mut self, base_folder: Option<PathBuf>) -> Self {
        self.base_folder = base_folder;
        self
    }

    /// Request for one discovered file, sharing this request's policy
    pub fn for_file(&self, input_path: PathBuf) -> Self {
        Self {
            input_path,
            ..self.clone()
        }
    }
}

/// Terminal state of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Completed,
    AlreadyProcessed,
    Skipped,
    Failed,
}

impl ConversionStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "OK",
            Self::AlreadyProcessed => "DONE",
            Self::Skipped => "SKIP",
            Self::Failed => "ERROR",
        }
    }
}

/// Outcome of one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    /// Empty when no output path applies
    pub output_path: String,
    pub status: ConversionStatus,
    pub message: String,
}

impl ConversionResult {
    pub fn completed(input: &Path, output: &Path) -> Self {
        Self {
            input_path: input.to_path_buf(),
            output_path: output.to_string_lossy().into_owned(),
            status: ConversionStatus::Completed,
            message: "Completed.".to_string(),
        }
    }

    /// The reported output path is the input itself: nothing left to do.
    pub fn already_processed(input: &Path) -> Self {
        Self {
            input_path: input.to_path_buf(),
            output_path: input.to_string_lossy().into_owned(),
            status: ConversionStatus::AlreadyProcessed,
            message: "Already processed.".to_string(),
        }
    }

    pub fn skipped(input: &Path, output: &Path, message: impl Into<String>) -> Self {
        Self {
            input_path: input.to_path_buf(),
            output_path: output.to_string_lossy().into_owned(),
            status: ConversionStatus::Skipped,
            message: message.into(),
        }
    }

    pub fn failed(input: &Path, output: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            input_path: input.to_path_buf(),
            output_path: output
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            status: ConversionStatus::Failed,
            message: message.into(),
        }
    }

    /// One-line status for terminal output
    pub fn status_line(&self) -> String {
        if self.output_path.is_empty() || self.status == ConversionStatus::AlreadyProcessed {
            format!("[{}] {}: {}", self.status.label(), self.input_path.display(), self.message)
        } else {
            format!(
                "[{}] {} -> {}: {}",
                self.status.label(),
                self.input_path.display(),
                self.output_path,
                self.message
            )
        }
    }
}

/// Ordered results of a batch, in discovery order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<ConversionResult>,
    /// Set when a directory input contained no matching file
    pub no_files_found: bool,
}

impl BatchReport {
    pub fn no_files() -> Self {
        Self {
            results: Vec::new(),
            no_files_found: true,
        }
    }

    pub fn push(&mut self, result: ConversionResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status.is_failure())
    }

    pub fn count(&self, status: ConversionStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// 0 when nothing failed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }
}
