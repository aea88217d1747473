//! # Converter Configuration File
//!
//! The external converter reads its output formatting options from a small
//! key=value file passed as its first argument. The content is a fixed
//! contract with the converter: the key set and the values never change.

use crate::error::ConvertError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Default file name of the converter configuration
pub const CONFIG_FILE_NAME: &str = "mdf2mat.ini";

/// Section header of the configuration file
pub const SECTION_HEADER: &str = "[MDF2MAT]";

/// Option keys and values, in file order
pub const OPTIONS: &[(&str, u8)] = &[
    ("OldMode", 0),
    ("LongSignalNames", 2),
    ("PhysFormat", 1),
    ("MatlabFormat", 1),
    ("Compression", 1),
    ("TimeEachSignal", 1),
    ("PrefixM", 1),
    ("ReplaceDot", 1),
    ("ExtendedNames", 0),
    ("TimeGridStep", 1),
    ("TimeGrid", 0),
    ("Interpolation", 1),
    ("StartTimeZero", 1),
    ("OnStartSignals", 0),
    ("DisplayName", 0),
];

/// Render the configuration file content
pub fn render() -> String {
    let mut content = String::from(SECTION_HEADER);
    content.push('\n');
    for (key, value) in OPTIONS {
        content.push_str(&format!("{}={}\n", key, value));
    }
    content
}

/// Write the configuration file if it does not exist yet.
///
/// The file is written to a temporary sibling and renamed into place, so
/// concurrent callers never observe a partially written file.
pub fn ensure_written(path: &Path) -> Result<PathBuf, ConvertError> {
    if path.is_file() {
        debug!("Converter configuration already present: {}", path.display());
        return Ok(path.to_path_buf());
    }

    let write_failed = |source: std::io::Error| ConvertError::ConfigWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(write_failed)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    temp.write_all(render().as_bytes()).map_err(write_failed)?;
    temp.persist(path).map_err(|e| write_failed(e.error))?;

    info!("Wrote converter configuration: {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_exact_content() {
        let expected = "[MDF2MAT]\n\
            OldMode=0\n\
            LongSignalNames=2\n\
            PhysFormat=1\n\
            MatlabFormat=1\n\
            Compression=1\n\
            TimeEachSignal=1\n\
            PrefixM=1\n\
            ReplaceDot=1\n\
            ExtendedNames=0\n\
            TimeGridStep=1\n\
            TimeGrid=0\n\
            Interpolation=1\n\
            StartTimeZero=1\n\
            OnStartSignals=0\n\
            DisplayName=0\n";
        assert_eq!(render(), expected);
    }

    #[test]
    fn test_ensure_written_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let written = ensure_written(&path).unwrap();

        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), render());
    }

    #[test]
    fn test_ensure_written_keeps_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "custom").unwrap();

        ensure_written(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "custom");
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_location_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = ensure_written(&blocker.join(CONFIG_FILE_NAME)).unwrap_err();

        assert!(matches!(err, ConvertError::ConfigWriteFailed { .. }));
        assert!(err.is_batch_fatal());
    }
}
