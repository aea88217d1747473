//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la discovery degli input.
//!
//! ## Responsabilità:
//! - Discovery (opzionalmente ricorsiva) dei file sotto una directory root
//! - Filtro case-insensitive per estensione
//! - Riconoscimento dei formati convertibili (MDF, DAT, XLG)
//! - Esclusione dei file già prodotti dal converter
//!
//! ## Ordinamento:
//! La discovery ordina le entry per nome dentro ogni directory, quindi
//! lo stesso albero produce sempre la stessa sequenza (report riproducibili).
//!
//! ## Esempio:
//! ```ignore
//! let discovery = FileDiscovery::new(&root, &["mdf".to_string()], true);
//! for file in discovery.iter() {
//!     // convert file
//! }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions the external converter accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mdf", "dat", "xlg"];

/// Lazy, restartable enumeration of input files under a root
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root: PathBuf,
    extension_filter: Vec<String>,
    /// Extension of produced files, never treated as input
    excluded_extension: Option<String>,
    recursive: bool,
}

impl FileDiscovery {
    /// An empty `extension_filter` accepts every regular file
    pub fn new(root: &Path, extension_filter: &[String], recursive: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            extension_filter: extension_filter
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            excluded_extension: None,
            recursive,
        }
    }

    /// Skip files carrying `extension`, e.g. outputs written next to their inputs
    pub fn excluding_extension(mut self, extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_lowercase();
        self.excluded_extension = (!ext.is_empty()).then_some(ext);
        self
    }

    /// Start a new walk over the tree; each call restarts from the root
    pub fn iter(&self) -> impl Iterator<Item = PathBuf> + '_ {
        let max_depth = if self.recursive { usize::MAX } else { 1 };

        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    // Una directory illeggibile non interrompe la discovery
                    warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(move |path| self.matches(path))
    }

    /// Collect the whole walk
    pub fn collect(&self) -> Vec<PathBuf> {
        let files: Vec<PathBuf> = self.iter().collect();
        debug!("Discovered {} files under {}", files.len(), self.root.display());
        files
    }

    fn matches(&self, path: &Path) -> bool {
        let ext = FileManager::extension_lowercase(path);
        if self.excluded_extension.is_some() && ext == self.excluded_extension {
            return false;
        }
        if self.extension_filter.is_empty() {
            return true;
        }
        ext.map(|ext| self.extension_filter.iter().any(|f| *f == ext))
            .unwrap_or(false)
    }
}

/// Manages file operations
pub struct FileManager;

impl FileManager {
    /// Get the size of a file in bytes
    pub async fn get_file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path).await?;
        Ok(metadata.len())
    }

    /// Lowercased extension of a path, if any
    pub fn extension_lowercase(path: &Path) -> Option<String> {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Check if a file format is accepted by the converter
    pub fn is_supported_format(path: &Path) -> bool {
        Self::extension_lowercase(path)
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("sub").join("deeper")).unwrap();
        std::fs::write(root.join("b.MDF"), b"x").unwrap();
        std::fs::write(root.join("a.dat"), b"x").unwrap();
        std::fs::write(root.join("notes.txt"), b"x").unwrap();
        std::fs::write(root.join("sub").join("c.xlg"), b"x").unwrap();
        std::fs::write(root.join("sub").join("deeper").join("d.mdf"), b"x").unwrap();
        temp_dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_non_recursive_discovery() {
        let tree = fixture_tree();
        let filter = vec!["mdf".to_string(), "dat".to_string(), "xlg".to_string()];

        let files = FileDiscovery::new(tree.path(), &filter, false).collect();

        assert_eq!(names(&files), vec!["a.dat", "b.MDF"]);
    }

    #[test]
    fn test_recursive_discovery() {
        let tree = fixture_tree();
        let filter = vec![".MDF".to_string()];

        let files = FileDiscovery::new(tree.path(), &filter, true).collect();

        assert_eq!(names(&files), vec!["b.MDF", "d.mdf"]);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let tree = fixture_tree();

        let files = FileDiscovery::new(tree.path(), &[], false).collect();

        assert_eq!(names(&files), vec!["a.dat", "b.MDF", "notes.txt"]);
    }

    #[test]
    fn test_discovery_is_restartable_and_deterministic() {
        let tree = fixture_tree();
        let discovery = FileDiscovery::new(tree.path(), &[], true);

        let first: Vec<PathBuf> = discovery.iter().collect();
        let second: Vec<PathBuf> = discovery.iter().collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_excluded_extension_skips_outputs() {
        let tree = fixture_tree();
        std::fs::write(tree.path().join("a.dat.mat"), b"x").unwrap();
        std::fs::write(tree.path().join("b.MDF.MAT"), b"x").unwrap();

        let files = FileDiscovery::new(tree.path(), &[], false)
            .excluding_extension(".mat")
            .collect();

        assert_eq!(names(&files), vec!["a.dat", "b.MDF", "notes.txt"]);
    }

    #[test]
    fn test_no_files_is_empty_not_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FileDiscovery::new(temp_dir.path(), &[], true).collect().is_empty());
    }

    #[test]
    fn test_supported_formats() {
        assert!(FileManager::is_supported_format(Path::new("/x/trace.MDF")));
        assert!(FileManager::is_supported_format(Path::new("/x/trace.dat")));
        assert!(FileManager::is_supported_format(Path::new("/x/trace.Xlg")));
        assert!(!FileManager::is_supported_format(Path::new("/x/trace.txt")));
        assert!(!FileManager::is_supported_format(Path::new("/x/mdf")));
    }
}
