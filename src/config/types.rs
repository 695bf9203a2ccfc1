//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{LARGE_FILE_SIZE_THRESHOLD, NATIVES_ENV};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Use the OS attribute provider when one is compiled in
    pub use_natives: bool,
    /// Delete worker pool size; 0 means available parallelism
    pub delete_threads: usize,
    /// Files at or above this many bytes are copied with the OS bulk primitive
    pub large_file_threshold: u64,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_natives: true,
            delete_threads: 0,
            large_file_threshold: LARGE_FILE_SIZE_THRESHOLD,
            log_level: LogLevel::Normal,
            log_file: None,
        }
    }
}

impl Config {
    /// Apply environment overrides on top of the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env::var_os(NATIVES_ENV) {
            if let Some(flag) = parse_switch(&v.to_string_lossy()) {
                self.use_natives = flag;
            }
        }
        self
    }

    /// Effective number of delete workers (never zero).
    pub fn effective_delete_threads(&self) -> usize {
        if self.delete_threads > 0 {
            return self.delete_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Accepts on/off style switches.
pub(crate) fn parse_switch(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}
