//! # Platform-specific utilities
//!
//! Questo modulo centralizza la logica cross-platform per trovare il
//! converter esterno: nome dell'eseguibile e directory di installazione
//! tipiche per ogni sistema operativo.

use std::env;
use std::path::PathBuf;

/// Base name of the converter executable
pub const CONVERTER_BASE_NAME: &str = "mdf2mat";

/// Platform-specific naming and install locations
pub struct PlatformCommands;

impl PlatformCommands {
    /// Executable file name of the converter on this platform
    pub fn converter_executable() -> String {
        if cfg!(windows) {
            format!("{}.exe", CONVERTER_BASE_NAME)
        } else {
            CONVERTER_BASE_NAME.to_string()
        }
    }

    /// Default installation directories, in scan order.
    ///
    /// `extra` directories come first, then the platform install roots,
    /// then every entry of `PATH`.
    pub fn candidate_directories(extra: &[PathBuf]) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = extra.to_vec();

        if cfg!(windows) {
            for var in ["ProgramFiles", "ProgramFiles(x86)", "LOCALAPPDATA"] {
                if let Some(value) = env::var_os(var) {
                    candidates.push(PathBuf::from(value));
                }
            }
        } else {
            candidates.push(PathBuf::from("/opt"));
            candidates.push(PathBuf::from("/usr/local/bin"));
            if let Some(home) = dirs::home_dir() {
                candidates.push(home.join(".local").join("bin"));
            }
        }

        if let Some(path) = env::var_os("PATH") {
            candidates.extend(env::split_paths(&path));
        }

        let mut unique = Vec::with_capacity(candidates.len());
        for dir in candidates {
            if !unique.contains(&dir) {
                unique.push(dir);
            }
        }
        unique
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}
