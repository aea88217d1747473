//! # MDF Converter - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Creazione della configurazione e avvio dell'orchestratore
//! - Traduzione dell'esito del batch in exit code
//!
//! ## Exit code:
//! - `0`: nessun file fallito (o nessun file trovato)
//! - `1`: almeno un file fallito
//! - `2`: errore fatale per il batch (converter o .ini non disponibili)
//!
//! ## Esempio di utilizzo:
//! ```bash
//! mdf-converter convert /data/traces /data/mat --recursive --structured --workers 4
//! mdf-converter locate
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mdf_converter::{
    json_output::JsonMessage,
    platform::PlatformCommands,
    request::{BatchReport, ConversionRequest, OutputTarget},
    tool_resolver::StdinSelector,
    BatchOrchestrator, Config, ConvertError, ConverterLocator, JsonPreferenceStore,
};

const EXIT_FATAL: i32 = 2;

#[derive(Parser)]
#[command(name = "mdf-converter")]
#[command(about = "Batch-convert MDF/DAT/XLG measurement files with an external converter")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file (CLI flags take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Explicit converter executable
    #[arg(long, global = true)]
    converter_path: Option<PathBuf>,

    /// Additional directory scanned for converter installations
    #[arg(long = "search-dir", global = true)]
    search_dirs: Vec<PathBuf>,

    /// Prompt for the converter location when none is found
    #[arg(long, global = true)]
    interactive: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a file or every file of a directory
    Convert(ConvertArgs),
    /// Locate the converter and print the selected binary
    Locate,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file or directory
    input: PathBuf,

    /// Output directory or file (defaults to the input's directory)
    output: Option<PathBuf>,

    /// Replace outputs that already exist
    #[arg(long)]
    overwrite: bool,

    /// Mirror the input directory structure under the output directory
    #[arg(long)]
    structured: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Only discover these extensions (comma separated)
    #[arg(long, value_delimiter = ',')]
    filter: Vec<String>,

    /// Number of parallel conversions
    #[arg(short, long)]
    workers: Option<usize>,

    /// Timeout for a single conversion, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Minimum input size in bytes
    #[arg(long)]
    min_size: Option<u64>,

    /// Dry run - never delete outputs nor invoke the converter
    #[arg(long)]
    dry_run: bool,

    /// Output progress and status as JSON
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG, se presente, ha la precedenza su --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if cli.converter_path.is_some() {
        config.converter_path = cli.converter_path.clone();
    }
    config.search_dirs.extend(cli.search_dirs.iter().cloned());

    let code = match &cli.command {
        Command::Locate => run_locate(&cli, &config).await,
        Command::Convert(args) => {
            apply_convert_args(&mut config, args);
            config.validate()?;
            run_convert(&cli, config, args).await
        }
    };

    std::process::exit(code);
}

fn apply_convert_args(config: &mut Config, args: &ConvertArgs) {
    if !args.filter.is_empty() {
        config.extension_filter = args
            .filter
            .iter()
            .map(|f| f.trim().trim_start_matches('.').to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.converter_timeout_secs = timeout;
    }
    if let Some(min_size) = args.min_size {
        config.min_file_size = min_size;
    }
    config.dry_run |= args.dry_run;
    config.json_output |= args.json;
    config.show_progress &= !args.no_progress;
}

fn build_locator(cli: &Cli, config: &Config) -> ConverterLocator {
    let preferences = Arc::new(JsonPreferenceStore::new(config.preferences_file()));
    let locator = ConverterLocator::from_config(config).with_preferences(preferences);
    if cli.interactive {
        locator.with_selector(Arc::new(StdinSelector))
    } else {
        locator
    }
}

async fn run_locate(cli: &Cli, config: &Config) -> i32 {
    let locator = build_locator(cli, config);
    match locator.locate(config.converter_path.as_deref()).await {
        Ok(binary) => {
            let binary = locator.describe(binary).await;
            println!("Converter: {}", binary.path.display());
            match &binary.version {
                Some(version) => println!("Version:   {}", version),
                None => println!("Version:   unknown"),
            }
            info!("{}", PlatformCommands::system_info());
            0
        }
        Err(e) => {
            error!("{}", e);
            EXIT_FATAL
        }
    }
}

async fn run_convert(cli: &Cli, config: Config, args: &ConvertArgs) -> i32 {
    let json_output = config.json_output;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.input));

    let request = ConversionRequest::new(args.input.clone(), OutputTarget::classify(&output))
        .with_overwrite(args.overwrite)
        .with_structured_output(args.structured)
        .with_recursive(args.recursive);

    let orchestrator = BatchOrchestrator::new(config.clone(), build_locator(cli, &config));

    match orchestrator.run(request).await {
        Ok(report) => {
            if !json_output {
                print_report(&report);
            }
            report.exit_code()
        }
        Err(e) => report_fatal(&e, json_output),
    }
}

/// Converted files land next to their inputs unless told otherwise
fn default_output_dir(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn print_report(report: &BatchReport) {
    if report.no_files_found {
        println!("No files found to convert.");
        return;
    }
    for result in &report.results {
        println!("{}", result.status_line());
    }
}

fn report_fatal(e: &ConvertError, json_output: bool) -> i32 {
    if json_output {
        let details = std::error::Error::source(e).map(|s| s.to_string());
        JsonMessage::error(e.to_string(), details).emit();
    } else {
        error!("{}", e);
    }
    if e.is_batch_fatal() {
        EXIT_FATAL
    } else {
        1
    }
}
