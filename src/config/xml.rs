//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - A missing file means "all defaults"; a malformed one is an error.
//!
//! Unknown XML fields are rejected so misconfigurations surface early.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::default_config_path;
use super::types::{parse_switch, Config, LogLevel};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "use_natives", default, deserialize_with = "de_switch_opt")]
    use_natives: Option<bool>,
    #[serde(rename = "delete_threads", default, deserialize_with = "de_u64_trimmed_opt")]
    delete_threads: Option<u64>,
    #[serde(rename = "large_file_threshold", default, deserialize_with = "de_u64_trimmed_opt")]
    large_file_threshold: Option<u64>,
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
}

// Custom deserializer that trims surrounding whitespace for optional u64
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<u64>().ok()))
}

fn de_switch_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| parse_switch(&s)))
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(flag) = parsed.use_natives {
        cfg.use_natives = flag;
    }
    if let Some(n) = parsed.delete_threads {
        cfg.delete_threads = usize::try_from(n).unwrap_or(usize::MAX);
    }
    if let Some(n) = parsed.large_file_threshold {
        cfg.large_file_threshold = n;
    }
    if let Some(s) = parsed.log_level.as_deref() {
        if let Ok(level) = s.trim().parse::<LogLevel>() {
            cfg.log_level = level;
        }
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }
    cfg
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_config(parsed))
}

/// Load the config from `$LOCALFS_CONFIG` or the default location, then apply
/// environment overrides. A missing file yields the defaults.
pub fn load_config() -> Result<Config> {
    let cfg = match default_config_path() {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "Loading config");
            load_config_from_xml_path(&path)?
        }
        Some(path) => {
            debug!(path = %path.display(), "No config file; using defaults");
            Config::default()
        }
        None => Config::default(),
    };
    Ok(cfg.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_all_fields() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(
            &p,
            "<config>\n  <use_natives> off </use_natives>\n  <delete_threads> 3 </delete_threads>\n  <large_file_threshold>4096</large_file_threshold>\n  <log_level>debug</log_level>\n  <log_file>/tmp/localfs.log</log_file>\n</config>\n",
        )
        .unwrap();
        let cfg = load_config_from_xml_path(&p).unwrap();
        assert!(!cfg.use_natives);
        assert_eq!(cfg.delete_threads, 3);
        assert_eq!(cfg.large_file_threshold, 4096);
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/localfs.log")));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, "<config><log_level>quiet</log_level></config>").unwrap();
        let cfg = load_config_from_xml_path(&p).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Quiet);
        assert!(cfg.use_natives);
        assert_eq!(cfg.large_file_threshold, Config::default().large_file_threshold);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, "<config><download_base>/x</download_base></config>").unwrap();
        let err = load_config_from_xml_path(&p).unwrap_err();
        assert!(format!("{err:#}").contains("parse config xml"));
    }
}
