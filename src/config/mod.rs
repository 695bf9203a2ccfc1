//! Config module.
//! Provides configuration types, default paths and XML loading, plus the
//! process-wide active configuration the store reads.

pub mod paths;
pub mod types;
pub mod xml;

use std::sync::OnceLock;

pub use paths::{default_config_path, default_log_path};
pub use types::{Config, LogLevel};
pub use xml::{load_config, load_config_from_xml_path};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "LOCALFS_CONFIG";
/// Environment switch for the native attribute provider (`off` disables it).
pub const NATIVES_ENV: &str = "LOCALFS_NATIVES";
/// Files at or above this size use the bulk copy primitive.
pub const LARGE_FILE_SIZE_THRESHOLD: u64 = 1024 * 1024;

static ACTIVE: OnceLock<Config> = OnceLock::new();

/// Install the process-wide configuration. Returns false when one is already
/// active (first use of the store freezes it).
pub fn install(cfg: Config) -> bool {
    ACTIVE.set(cfg).is_ok()
}

/// The active configuration; defaults plus environment overrides when none
/// was installed.
pub fn active() -> &'static Config {
    ACTIVE.get_or_init(|| Config::default().with_env_overrides())
}
