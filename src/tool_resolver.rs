//! # Converter Locator
//!
//! This module handles finding the external converter executable:
//! - A cached location (explicit argument or preference store) wins when it still exists
//! - Otherwise every candidate installation directory is scanned
//! - When several versions are installed side by side, each one is asked for
//!   its version banner (`V<version> (<date>)`) and the newest is selected
//!
//! The resolved binary is returned by value; callers thread it through the
//! batch as read-only context.

use crate::config::Config;
use crate::error::ConvertError;
use crate::platform::PlatformCommands;
use crate::state::{PreferenceStore, CONVERTER_PATH_KEY};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// How deep below a candidate directory installations are searched
const SCAN_DEPTH: usize = 3;

/// Date layouts seen in converter version banners
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%Y", "%d-%b-%Y", "%b %d %Y", "%d %b %Y", "%B %d, %Y",
];

fn banner_regex() -> &'static Regex {
    static BANNER: OnceLock<Regex> = OnceLock::new();
    BANNER.get_or_init(|| {
        Regex::new(r"V(\d+(?:\.\d+)*)\s*\(([^)]*)\)").expect("static version banner pattern")
    })
}

/// Version token parsed from a converter banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterVersion {
    pub date: Option<NaiveDate>,
    pub version: Vec<u32>,
    /// The banner fragment the token was parsed from
    pub raw: String,
}

impl Ord for ConverterVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for ConverterVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ConverterVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse the first `V<version> (<date>)` token found in `text`
pub fn parse_version_banner(text: &str) -> Option<ConverterVersion> {
    let captures = banner_regex().captures(text)?;
    let version: Vec<u32> = captures[1]
        .split('.')
        .filter_map(|part| part.parse().ok())
        .collect();
    let date_text = captures[2].trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_text, fmt).ok());

    if date.is_none() {
        debug!("Unparsable date in version banner: {:?}", date_text);
    }

    Some(ConverterVersion {
        date,
        version,
        raw: captures[0].to_string(),
    })
}

/// A resolved converter executable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterBinary {
    pub path: PathBuf,
    pub version: Option<ConverterVersion>,
}

impl ConverterBinary {
    pub fn unversioned(path: PathBuf) -> Self {
        Self { path, version: None }
    }
}

/// Pick the newest candidate; with no parsable version, the last one enumerated
pub fn rank_candidates(candidates: Vec<ConverterBinary>) -> Option<ConverterBinary> {
    if candidates.iter().all(|c| c.version.is_none()) {
        return candidates.into_iter().last();
    }
    // max_by keeps the last of equal elements
    candidates
        .into_iter()
        .max_by(|a, b| a.version.cmp(&b.version))
}

/// Asks for a converter location when none can be found
pub trait FileSelector: Send + Sync {
    fn select_converter(&self, executable_name: &str) -> Option<PathBuf>;
}

/// Selector that always declines
pub struct DeclineSelector;

impl FileSelector for DeclineSelector {
    fn select_converter(&self, _executable_name: &str) -> Option<PathBuf> {
        None
    }
}

/// Selector prompting on the terminal; an empty answer declines
pub struct StdinSelector;

impl FileSelector for StdinSelector {
    fn select_converter(&self, executable_name: &str) -> Option<PathBuf> {
        eprint!("Path to {} (empty to cancel): ", executable_name);
        std::io::stderr().flush().ok()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).ok()?;
        let answer = line.trim();
        if answer.is_empty() {
            None
        } else {
            Some(PathBuf::from(answer))
        }
    }
}

/// Finds and version-ranks the converter executable
pub struct ConverterLocator {
    candidate_dirs: Vec<PathBuf>,
    executable_name: String,
    version_flag: String,
    probe_timeout: Duration,
    selector: Arc<dyn FileSelector>,
    preferences: Option<Arc<dyn PreferenceStore>>,
}

impl ConverterLocator {
    /// Create a locator scanning exactly `candidate_dirs`
    pub fn new(candidate_dirs: Vec<PathBuf>, executable_name: impl Into<String>) -> Self {
        Self {
            candidate_dirs,
            executable_name: executable_name.into(),
            version_flag: "-h".to_string(),
            probe_timeout: Duration::from_secs(10),
            selector: Arc::new(DeclineSelector),
            preferences: None,
        }
    }

    /// Locator scanning configured and platform default directories
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PlatformCommands::candidate_directories(&config.search_dirs),
            PlatformCommands::converter_executable(),
        )
        .with_version_flag(&config.version_flag)
        .with_probe_timeout(config.probe_timeout())
    }

    pub fn with_selector(mut self, selector: Arc<dyn FileSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_version_flag(mut self, flag: &str) -> Self {
        self.version_flag = flag.to_string();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Resolve the converter.
    ///
    /// `cached` (or, when absent, the preference store entry) is returned
    /// untouched if the file still exists. Otherwise the candidate
    /// directories are scanned and the result is written back to the
    /// preference store.
    pub async fn locate(&self, cached: Option<&Path>) -> Result<ConverterBinary, ConvertError> {
        let cached = cached
            .map(Path::to_path_buf)
            .or_else(|| self.preferences.as_ref().and_then(|p| p.load(CONVERTER_PATH_KEY)));

        if let Some(path) = cached {
            if path.is_file() {
                debug!("Using cached converter: {}", path.display());
                return Ok(ConverterBinary::unversioned(path));
            }
            warn!("Cached converter no longer exists, rescanning: {}", path.display());
        }

        let mut candidates = self.enumerate();
        debug!("Found {} converter candidates", candidates.len());

        let selected = match candidates.len() {
            0 => {
                // Il selector può bloccare su stdin: fuori dai worker del runtime
                let selector = Arc::clone(&self.selector);
                let name = self.executable_name.clone();
                let manual = tokio::task::spawn_blocking(move || selector.select_converter(&name))
                    .await
                    .ok()
                    .flatten()
                    .filter(|p| p.is_file())
                    .ok_or_else(|| ConvertError::ConverterNotFound(self.executable_name.clone()))?;
                ConverterBinary::unversioned(manual)
            }
            1 => ConverterBinary::unversioned(candidates.remove(0)),
            _ => self.select_newest(candidates).await?,
        };

        info!("Using converter: {}", selected.path.display());
        self.remember(&selected.path);
        Ok(selected)
    }

    /// Every converter executable under the candidate directories, in scan order
    pub fn enumerate(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = Vec::new();

        for dir in self.candidate_dirs.iter().filter(|d| d.is_dir()) {
            // Installazioni linkate in bin/ sono symlink al binario reale
            let matches = WalkDir::new(dir)
                .max_depth(SCAN_DEPTH)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && self.is_converter_name(e.file_name()))
                .map(|e| e.into_path());

            for path in matches {
                let canonical = path.canonicalize().unwrap_or(path);
                if !found.contains(&canonical) {
                    debug!("Converter candidate: {}", canonical.display());
                    found.push(canonical);
                }
            }
        }

        found
    }

    fn is_converter_name(&self, name: &std::ffi::OsStr) -> bool {
        let name = name.to_string_lossy();
        if cfg!(windows) {
            name.eq_ignore_ascii_case(&self.executable_name)
        } else {
            name == self.executable_name.as_str()
        }
    }

    /// Fill in the version of a binary that was resolved without probing
    pub async fn describe(&self, binary: ConverterBinary) -> ConverterBinary {
        if binary.version.is_some() {
            return binary;
        }
        let version = self.probe_version(&binary.path).await;
        ConverterBinary { version, ..binary }
    }

    async fn select_newest(&self, candidates: Vec<PathBuf>) -> Result<ConverterBinary, ConvertError> {
        let mut probed = Vec::with_capacity(candidates.len());
        for path in candidates {
            let version = self.probe_version(&path).await;
            match &version {
                Some(v) => debug!("{} reports {}", path.display(), v),
                None => debug!("{} reports no parsable version", path.display()),
            }
            probed.push(ConverterBinary { path, version });
        }

        let selected = rank_candidates(probed)
            .ok_or_else(|| ConvertError::ConverterNotFound(self.executable_name.clone()))?;
        if selected.version.is_none() {
            warn!(
                "No converter reported a parsable version, using last candidate: {}",
                selected.path.display()
            );
        }
        Ok(selected)
    }

    /// Run the converter with the version flag and parse its banner
    async fn probe_version(&self, path: &Path) -> Option<ConverterVersion> {
        let mut cmd = Command::new(path);
        cmd.arg(&self.version_flag)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.probe_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("Failed to run {}: {}", path.display(), e);
                return None;
            }
            Err(_) => {
                warn!("Version probe timed out: {}", path.display());
                return None;
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        parse_version_banner(&text)
    }

    fn remember(&self, path: &Path) {
        if let Some(ref preferences) = self.preferences {
            if let Err(e) = preferences.store(CONVERTER_PATH_KEY, path) {
                warn!("Failed to persist converter location: {}", e);
            }
        }
    }
}
