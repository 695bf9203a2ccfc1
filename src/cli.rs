//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - Flags override values from config.xml.

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};

/// Inspect and manipulate local files through the localfs store.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Attribute-aware local file operations")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, global = true, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Use the portable attribute fallback instead of the OS provider.
    #[arg(long, global = true)]
    pub no_natives: bool,

    /// Number of delete worker threads (0 = one per CPU).
    #[arg(long, global = true, value_name = "N")]
    pub delete_threads: Option<usize>,

    /// Emit results and logs as JSON.
    #[arg(long, global = true, help = "Emit results and logs in structured JSON")]
    pub json: bool,

    /// Print where localfs will look for the config file, then exit.
    #[arg(long, help = "Print the config file location and exit")]
    pub print_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show metadata of a path.
    Info {
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
    },
    /// List a directory.
    Ls {
        #[arg(value_hint = ValueHint::DirPath)]
        path: PathBuf,
    },
    /// Create a directory.
    Mkdir {
        #[arg(value_hint = ValueHint::DirPath)]
        path: PathBuf,
        /// Create missing parents as well.
        #[arg(short, long)]
        parents: bool,
    },
    /// Delete a file or a whole directory tree.
    Rm {
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
    },
    /// Copy a file or directory tree.
    Cp {
        #[arg(value_hint = ValueHint::AnyPath)]
        source: PathBuf,
        #[arg(value_hint = ValueHint::AnyPath)]
        dest: PathBuf,
        /// Replace existing destination files.
        #[arg(short, long)]
        overwrite: bool,
    },
    /// Move or rename a file or directory tree.
    Mv {
        #[arg(value_hint = ValueHint::AnyPath)]
        source: PathBuf,
        #[arg(value_hint = ValueHint::AnyPath)]
        dest: PathBuf,
        /// Replace an existing destination.
        #[arg(short, long)]
        overwrite: bool,
    },
    /// Change attributes or the modification time of a path.
    SetAttr {
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
        read_only: Option<bool>,
        #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
        hidden: Option<bool>,
        #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
        archive: Option<bool>,
        #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
        executable: Option<bool>,
        /// Modification time in milliseconds since the Unix epoch.
        #[arg(long, value_name = "MILLIS", allow_negative_numbers = true)]
        last_modified: Option<i64>,
    },
    /// Show which attributes this host supports.
    Caps,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
        if self.no_natives {
            cfg.use_natives = false;
        }
        if let Some(n) = self.delete_threads {
            cfg.delete_threads = n;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_config() {
        let args = Args::parse_from(["localfs", "--debug", "--no-natives", "--delete-threads", "2", "caps"]);
        let mut cfg = Config::default();
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert!(!cfg.use_natives);
        assert_eq!(cfg.delete_threads, 2);
        assert!(matches!(args.command, Some(Command::Caps)));
    }

    #[test]
    fn set_attr_takes_explicit_bools() {
        let args = Args::parse_from(["localfs", "set-attr", "f.txt", "--read-only", "true", "--hidden", "false"]);
        match args.command {
            Some(Command::SetAttr { read_only, hidden, archive, .. }) => {
                assert_eq!(read_only, Some(true));
                assert_eq!(hidden, Some(false));
                assert_eq!(archive, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_log_level_is_ignored() {
        let args = Args::parse_from(["localfs", "--log-level", "loud", "caps"]);
        assert_eq!(args.effective_log_level(), None);
    }
}
