//! # Conversion Engine Module
//!
//! Worker per la conversione di singoli file.
//!
//! Ogni file attraversa una piccola macchina a stati:
//! 1. estensione non supportata -> `Failed`
//! 2. output già presente senza overwrite -> `AlreadyProcessed`
//! 3. output presente, overwrite, eliminazione fallita -> `Failed`
//! 4. input sotto la soglia minima -> `Failed`
//! 5. invocazione del converter (con timeout)
//! 6. "cannot open input file" nell'output del converter -> `Failed`
//! 7. file di output presente -> `Completed`, altrimenti `Failed`
//!
//! Nessun errore esce dall'engine: ogni esito diventa un `ConversionResult`.

use crate::{
    args,
    config::Config,
    converter::path_resolver::PathResolver,
    error::ConvertError,
    file_manager::FileManager,
    request::{ConversionRequest, ConversionResult},
    tool_resolver::ConverterBinary,
};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

/// Substring the converter prints when it cannot read its input
pub const INPUT_UNREADABLE_SIGNAL: &str = "cannot open input file";

/// Converts single files with a resolved converter
#[derive(Clone)]
pub struct ConversionEngine {
    config: Config,
    converter: Arc<ConverterBinary>,
    converter_config_file: PathBuf,
}

impl ConversionEngine {
    pub fn new(config: Config, converter: Arc<ConverterBinary>, converter_config_file: PathBuf) -> Self {
        Self {
            config,
            converter,
            converter_config_file,
        }
    }

    /// Convert one file; never fails, every outcome is a result
    pub async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        let input = request.input_path.as_path();
        debug!("Converting {}", input.display());

        if !FileManager::is_supported_format(input) {
            let ext = FileManager::extension_lowercase(input).unwrap_or_else(|| "(none)".to_string());
            return Self::failed(input, None, ConvertError::InvalidExtension(ext));
        }

        let output = match PathResolver::compute_output_path(input, request, self.config.output_extension()) {
            Ok(output) => output,
            Err(e) => return Self::failed(input, None, e),
        };

        if output.exists() {
            if !request.overwrite {
                debug!("[OK] Output already exists: {} -> {}", input.display(), output.display());
                return ConversionResult::already_processed(input);
            }
            if !self.config.dry_run {
                if let Err(source) = tokio::fs::remove_file(&output).await {
                    return Self::failed(
                        input,
                        Some(&output),
                        ConvertError::DeleteFailed {
                            path: output.clone(),
                            source,
                        },
                    );
                }
                debug!("Deleted existing output: {}", output.display());
            }
        }

        match FileManager::get_file_size(input).await {
            Ok(size) if size < self.config.min_file_size => {
                return Self::failed(
                    input,
                    Some(&output),
                    ConvertError::TooSmall {
                        size,
                        min: self.config.min_file_size,
                    },
                );
            }
            Ok(_) => {}
            Err(e) => {
                return Self::failed(
                    input,
                    Some(&output),
                    ConvertError::UnknownConversionFailure(format!("cannot stat input: {}", e)),
                );
            }
        }

        if self.config.dry_run {
            return ConversionResult::skipped(
                input,
                &output,
                format!("Dry run: would write {}", output.display()),
            );
        }

        if let Err(e) = PathResolver::ensure_parent_dirs(&output).await {
            return Self::failed(input, Some(&output), e);
        }

        match self.invoke(input, &output).await {
            Ok(()) => ConversionResult::completed(input, &output),
            Err(e) => Self::failed(input, Some(&output), e),
        }
    }

    /// Run the converter and check what it left behind
    async fn invoke(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let args = args![
            self.converter_config_file.display(),
            input.display(),
            output.display(),
        ];

        let mut cmd = Command::new(&self.converter.path);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let timeout = self.config.converter_timeout();
        let result = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                return Err(ConvertError::UnknownConversionFailure(format!(
                    "failed to run {}: {}",
                    self.converter.path.display(),
                    e
                )));
            }
            Err(_) => {
                warn!("Converter timed out after {:?}: {}", timeout, input.display());
                return Err(ConvertError::UnknownConversionFailure(format!(
                    "converter timed out after {}s",
                    timeout.as_secs()
                )));
            }
        };

        let mut text = String::from_utf8_lossy(&result.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&result.stderr));
        debug!("Converter output for {}: {}", input.display(), text.trim());

        if text.to_lowercase().contains(INPUT_UNREADABLE_SIGNAL) {
            return Err(ConvertError::InputUnreadable(input.to_path_buf()));
        }

        // L'exit code non è affidabile: conta solo la presenza del file
        if !result.status.success() {
            debug!("Converter exited with {}", result.status);
        }

        let produced = tokio::fs::metadata(output)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if produced {
            Ok(())
        } else {
            Err(ConvertError::UnknownConversionFailure(format!(
                "no output produced at {}",
                output.display()
            )))
        }
    }

    fn failed(input: &Path, output: Option<&Path>, error: ConvertError) -> ConversionResult {
        debug!("[ERROR] {}: {}", input.display(), error);
        ConversionResult::failed(input, output, error.to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::request::{ConversionStatus, OutputTarget};
    use crate::test_support::{
        copying_converter, hanging_converter, invocations, silent_converter, unreadable_converter,
        write_sized,
    };
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        log: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let log = dir.path().join("invocations.log");
            std::fs::create_dir_all(dir.path().join("bin")).unwrap();
            std::fs::create_dir_all(dir.path().join("in")).unwrap();
            std::fs::create_dir_all(dir.path().join("out")).unwrap();
            Self { dir, log }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.dir.path().join(rel)
        }

        fn engine_with(&self, converter: PathBuf, config: Config) -> ConversionEngine {
            ConversionEngine::new(
                config,
                Arc::new(ConverterBinary::unversioned(converter)),
                self.path("mdf2mat.ini"),
            )
        }

        fn copying_engine(&self, config: Config) -> ConversionEngine {
            let converter = copying_converter(&self.path("bin"), &self.log);
            self.engine_with(converter, config)
        }

        fn request(&self, input: &str) -> ConversionRequest {
            ConversionRequest::new(self.path(input), OutputTarget::Directory(self.path("out")))
        }
    }

    #[tokio::test]
    async fn test_completed_conversion() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/x.mdf"), 2000);
        let engine = fx.copying_engine(Config::default());

        let result = engine.convert(&fx.request("in/x.mdf")).await;

        assert_eq!(result.status, ConversionStatus::Completed);
        assert_eq!(result.message, "Completed.");
        assert!(fx.path("out/x.mdf.mat").is_file());
        assert_eq!(invocations(&fx.log), 1);
    }

    #[tokio::test]
    async fn test_invalid_extension_never_invokes() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/z.txt"), 5000);
        let engine = fx.copying_engine(Config::default());

        let result = engine.convert(&fx.request("in/z.txt")).await;

        assert_eq!(result.status, ConversionStatus::Failed);
        assert!(result.output_path.is_empty());
        assert!(result.message.starts_with("Invalid file extension"));
        assert_eq!(invocations(&fx.log), 0);
    }

    #[tokio::test]
    async fn test_existing_output_without_overwrite() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/x.dat"), 2000);
        write_sized(&fx.path("out/x.dat.mat"), 10);
        let engine = fx.copying_engine(Config::default());

        let result = engine.convert(&fx.request("in/x.dat")).await;

        assert_eq!(result.status, ConversionStatus::AlreadyProcessed);
        assert_eq!(result.output_path, fx.path("in/x.dat").to_string_lossy());
        assert_eq!(invocations(&fx.log), 0);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_existing_output() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/x.xlg"), 2000);
        write_sized(&fx.path("out/x.xlg.mat"), 10);
        let engine = fx.copying_engine(Config::default());

        let result = engine.convert(&fx.request("in/x.xlg").with_overwrite(true)).await;

        assert_eq!(result.status, ConversionStatus::Completed);
        assert_eq!(std::fs::metadata(fx.path("out/x.xlg.mat")).unwrap().len(), 2000);
        assert_eq!(invocations(&fx.log), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/x.mdf"), 2000);
        // a directory in place of the output cannot be removed as a file
        std::fs::create_dir_all(fx.path("out/x.mdf.mat")).unwrap();
        let engine = fx.copying_engine(Config::default());

        let result = engine.convert(&fx.request("in/x.mdf").with_overwrite(true)).await;

        assert_eq!(result.status, ConversionStatus::Failed);
        assert!(result.message.starts_with("Unable to delete existing output"));
        assert_eq!(invocations(&fx.log), 0);
    }

    #[tokio::test]
    async fn test_too_small_never_invokes() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/y.mdf"), 500);
        let engine = fx.copying_engine(Config::default());

        let result = engine.convert(&fx.request("in/y.mdf")).await;

        assert_eq!(result.status, ConversionStatus::Failed);
        assert!(result.message.starts_with("File too small"));
        assert_eq!(invocations(&fx.log), 0);
    }

    #[tokio::test]
    async fn test_unreadable_input_signal() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/x.mdf"), 2000);
        let engine = fx.engine_with(unreadable_converter(&fx.path("bin")), Config::default());

        let result = engine.convert(&fx.request("in/x.mdf")).await;

        assert_eq!(result.status, ConversionStatus::Failed);
        assert!(result.message.starts_with("Converter cannot open input file"));
    }

    #[tokio::test]
    async fn test_missing_output_is_unknown_failure() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/x.mdf"), 2000);
        let engine = fx.engine_with(silent_converter(&fx.path("bin")), Config::default());

        let result = engine.convert(&fx.request("in/x.mdf")).await;

        assert_eq!(result.status, ConversionStatus::Failed);
        assert!(result.message.starts_with("Unknown conversion failure"));
    }

    #[tokio::test]
    async fn test_timeout_is_unknown_failure() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/x.mdf"), 2000);
        let config = Config {
            converter_timeout_secs: 1,
            ..Default::default()
        };
        let engine = fx.engine_with(hanging_converter(&fx.path("bin")), config);

        let result = engine.convert(&fx.request("in/x.mdf")).await;

        assert_eq!(result.status, ConversionStatus::Failed);
        assert!(result.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_dry_run_skips_invocation() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/x.mdf"), 2000);
        let config = Config {
            dry_run: true,
            ..Default::default()
        };
        let engine = fx.copying_engine(config);

        let result = engine.convert(&fx.request("in/x.mdf")).await;

        assert_eq!(result.status, ConversionStatus::Skipped);
        assert!(!fx.path("out/x.mdf.mat").exists());
        assert_eq!(invocations(&fx.log), 0);
    }

    #[tokio::test]
    async fn test_structured_output_creates_directories() {
        let fx = Fixture::new();
        write_sized(&fx.path("in/a/b/f.mdf"), 2000);
        let engine = fx.copying_engine(Config::default());
        let request = fx
            .request("in/a/b/f.mdf")
            .with_structured_output(true)
            .with_base_folder(Some(fx.path("in")));

        let result = engine.convert(&request).await;

        assert_eq!(result.status, ConversionStatus::Completed);
        assert!(fx.path("out/a/b/f.mdf.mat").is_file());
    }
}
