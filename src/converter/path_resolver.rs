//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path:
//! - normalizzazione di path parziali/relativi in path assoluti
//! - calcolo del path di output per un input, in modalità flat o strutturata
//!
//! ## Remapping strutturato
//! In modalità strutturata la directory dell'input viene rimappata con una
//! sostituzione letterale di stringa: la prima occorrenza di `base_folder`
//! nella directory dell'input viene sostituita con la directory di output.
//! Non è un'operazione sui segmenti del path: un input fuori da `base_folder`
//! che contiene la stessa sottostringa viene rimappato comunque.
//!
//! ```text
//! Input:  /data/run/a/b/f.mdf
//! Base:   /data/run/
//! Output: /out/  ->  /out/a/b/f.mdf.mat
//! ```

use crate::error::ConvertError;
use crate::request::{ConversionRequest, OutputTarget};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{debug, warn};

/// Utility per calcolare i path in modo centralizzato
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    /// Directory cercate per input indicati con il solo nome del file
    search_path: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// Resolve a partial or relative path to an absolute one.
    ///
    /// A bare file name is looked up in the search path first; when nothing
    /// matches it is placed in the current working directory. `~` expands to
    /// the home directory. With `must_exist`, a path that resolves to nothing
    /// on disk is a `PathNotFound` error.
    pub fn resolve_absolute(&self, path: &Path, must_exist: bool) -> Result<PathBuf, ConvertError> {
        let raw = path.to_string_lossy();
        let is_home_relative = raw.starts_with('~');
        let is_bare_name = !path.has_root()
            && !is_home_relative
            && path.parent().map_or(true, |p| p.as_os_str().is_empty());

        let resolved = if is_bare_name {
            match self.find_in_search_path(path) {
                Some(found) => {
                    debug!("Found {} in search path: {}", raw, found.display());
                    found
                }
                None => std::env::current_dir()?.join(path),
            }
        } else if is_home_relative {
            let home = dirs::home_dir().ok_or_else(|| ConvertError::PathNotFound(path.to_path_buf()))?;
            let rest = raw[1..].trim_start_matches(['/', '\\']);
            home.join(rest)
        } else if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        if resolved.exists() {
            // Canonicalizza per avere path stabili nei report
            Ok(resolved.canonicalize().unwrap_or(resolved))
        } else if must_exist {
            Err(ConvertError::PathNotFound(path.to_path_buf()))
        } else {
            Ok(resolved)
        }
    }

    fn find_in_search_path(&self, name: &Path) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Compute the output path for one input file.
    ///
    /// The output name keeps the full input file name and appends
    /// `output_extension` (`f.mdf` -> `f.mdf.mat`). A file target is used
    /// verbatim.
    pub fn compute_output_path(
        input_path: &Path,
        request: &ConversionRequest,
        output_extension: &str,
    ) -> Result<PathBuf, ConvertError> {
        match &request.output_target {
            OutputTarget::File(target) => {
                let matches = target
                    .extension()
                    .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(output_extension))
                    .unwrap_or(false);
                if !matches {
                    warn!(
                        "Output file {} does not have the expected .{} extension",
                        target.display(),
                        output_extension
                    );
                }
                Ok(target.clone())
            }
            OutputTarget::Directory(dir) => {
                let file_name = input_path
                    .file_name()
                    .ok_or_else(|| ConvertError::PathNotFound(input_path.to_path_buf()))?
                    .to_string_lossy();

                let mut output_dir = with_trailing_separator(&dir.to_string_lossy());
                if request.structured_output {
                    if let Some(ref base) = request.base_folder {
                        output_dir = Self::remap_structured(input_path, base, &output_dir);
                    }
                }

                let result = PathBuf::from(output_dir).join(format!("{}.{}", file_name, output_extension));
                debug!("Resolved output path: {} -> {}", input_path.display(), result.display());
                Ok(result)
            }
        }
    }

    /// Literal substitution of `base_folder` inside the input's directory
    fn remap_structured(input_path: &Path, base_folder: &Path, output_dir: &str) -> String {
        let input_dir = input_path.parent().unwrap_or(Path::new(""));
        let input_dir = with_trailing_separator(&input_dir.to_string_lossy());
        let base = with_trailing_separator(&base_folder.to_string_lossy());

        if !input_dir.contains(&base) {
            debug!(
                "[REMAP] base {} not found in {}, keeping input directory",
                base, input_dir
            );
        }
        input_dir.replacen(&base, output_dir, 1)
    }

    /// Create the parent directories of `path` if needed.
    ///
    /// Concurrent creation of the same directory is not an error.
    pub async fn ensure_parent_dirs(path: &Path) -> Result<(), ConvertError> {
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                if e.kind() != std::io::ErrorKind::AlreadyExists || !parent.is_dir() {
                    return Err(ConvertError::Io(e));
                }
            }
        }
        Ok(())
    }
}

fn with_trailing_separator(path: &str) -> String {
    if path.is_empty() || path.ends_with('/') || path.ends_with(MAIN_SEPARATOR) {
        path.to_string()
    } else {
        format!("{}{}", path, MAIN_SEPARATOR)
    }
}
