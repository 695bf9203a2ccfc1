//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler and
//! dispatches the chosen subcommand to the store.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use localfs::cli::{Args, Command};
use localfs::config::{self, load_config};
use localfs::output as out;
use localfs::{
    capabilities, default_config_path, native, Attributes, CancelToken, LocalFileStore,
    NullProgress, Options,
};

use crate::logging::init_tracing;

#[derive(Serialize)]
struct OpResult<'a> {
    op: &'a str,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dest: Option<String>,
}

#[derive(Serialize)]
struct CapsReport {
    provider: &'static str,
    attributes: Attributes,
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        match default_config_path() {
            Some(p) => {
                out::print_info(&format!("localfs config path:\n  {}\n", p.display()));
                if !p.exists() {
                    out::print_info("No config file exists there; defaults are in use.");
                }
            }
            None => out::print_error("Could not determine a default config path"),
        }
        return Ok(());
    }

    let Some(command) = args.command.clone() else {
        bail!("no command given; run with --help to see the available commands");
    };

    // Config file first, CLI flags win.
    let mut cfg = load_config()?;
    args.apply_overrides(&mut cfg);

    let _guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {}", e));
        e
    })?;
    if !config::install(cfg) {
        debug!("configuration was already active; CLI overrides ignored");
    }

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.cancel();
            out::print_warn("Received interrupt; stopping at the next checkpoint...");
        })
        .context("failed to install signal handler")?;
    }

    debug!(?command, "Starting localfs");
    let monitor = NullProgress::with_cancel(cancel);
    execute(&command, args.json, &monitor)
}

fn execute(command: &Command, json: bool, monitor: &NullProgress) -> Result<()> {
    match command {
        Command::Info { path } => {
            let info = LocalFileStore::new(path).fetch_info();
            if json {
                out::print_json(&info);
            } else {
                out::print_user(&out::format_entry(&info));
                if let Some(kind) = info.error {
                    out::print_warn(&format!("metadata could not be read completely ({kind})"));
                }
            }
        }
        Command::Ls { path } => {
            let store = LocalFileStore::new(path);
            let info = store.fetch_info();
            if !info.exists {
                bail!("not found: {store}");
            }
            if !info.is_directory {
                bail!("not a directory: {store}");
            }
            let infos = store.child_infos();
            if json {
                out::print_json(&infos);
            } else {
                for child in &infos {
                    out::print_user(&out::format_entry(child));
                }
            }
        }
        Command::Mkdir { path, parents } => {
            let store = LocalFileStore::new(path);
            let options = if *parents { Options::NONE } else { Options::SHALLOW };
            store.mkdir(options)?;
            report(json, "mkdir", &store, None);
        }
        Command::Rm { path } => {
            let store = LocalFileStore::new(path);
            store.delete_with(monitor)?;
            report(json, "rm", &store, None);
        }
        Command::Cp { source, dest, overwrite } => {
            let (src, dst) = (LocalFileStore::new(source), LocalFileStore::new(dest));
            src.copy_with(&dst, overwrite_option(*overwrite), monitor)?;
            report(json, "cp", &src, Some(&dst));
        }
        Command::Mv { source, dest, overwrite } => {
            let (src, dst) = (LocalFileStore::new(source), LocalFileStore::new(dest));
            src.move_with(&dst, overwrite_option(*overwrite), monitor)?;
            report(json, "mv", &src, Some(&dst));
        }
        Command::SetAttr { path, read_only, hidden, archive, executable, last_modified } => {
            let store = LocalFileStore::new(path);
            let mut info = store.fetch_info();
            if !info.exists {
                bail!("not found: {store}");
            }
            let mut options = Options::NONE;
            for (attr, value) in [
                (Attributes::READ_ONLY, read_only),
                (Attributes::HIDDEN, hidden),
                (Attributes::ARCHIVE, archive),
                (Attributes::EXECUTABLE, executable),
            ] {
                if let Some(on) = value {
                    if !capabilities::is_supported(attr) {
                        out::print_warn(&format!("attribute '{attr}' is not supported here; ignored"));
                    }
                    info.set_attribute(attr, *on);
                    options = options | Options::SET_ATTRIBUTES;
                }
            }
            if let Some(millis) = last_modified {
                info.last_modified = *millis;
                options = options | Options::SET_LAST_MODIFIED;
            }
            store.put_info(&info, options)?;
            info!(path = %store, attributes = %info.attributes, "Attributes updated");
            let updated = store.fetch_info();
            if json {
                out::print_json(&updated);
            } else {
                out::print_user(&out::format_entry(&updated));
            }
        }
        Command::Caps => {
            let report = CapsReport {
                provider: native::provider().name(),
                attributes: capabilities::capabilities(),
            };
            if json {
                out::print_json(&report);
            } else {
                out::print_user(&format!("provider: {}", report.provider));
                out::print_user(&format!("attributes: {}", report.attributes));
            }
        }
    }
    Ok(())
}

fn overwrite_option(overwrite: bool) -> Options {
    if overwrite { Options::OVERWRITE } else { Options::NONE }
}

fn report(json: bool, op: &str, store: &LocalFileStore, dest: Option<&LocalFileStore>) {
    if json {
        out::print_json(&OpResult {
            op,
            path: store.to_string(),
            dest: dest.map(ToString::to_string),
        });
        return;
    }
    match dest {
        Some(d) => out::print_success(&format!("{op} {store} -> {d}")),
        None => out::print_success(&format!("{op} {store}")),
    }
}
