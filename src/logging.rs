//! Tracing setup for the binary.
//!
//! One console layer on stderr (stdout carries command output) and, when a
//! log file is configured and can be opened, a second non-blocking layer
//! writing the same events to that file. `--json` switches both layers to
//! JSON lines. Thread names are included so delete workers show up as
//! `localfs-deleter-N`.

use anyhow::Result;
use chrono::Local;
use localfs::output as out;
use localfs::{LogLevel, default_log_path};
use std::fmt as stdfmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// DD/MM/YY HH:MM:SS in local time.
struct LocalHumanTime;

impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

fn level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

fn fmt_layer<W>(writer: W, json: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tsfmt::layer()
        .with_timer(LocalHumanTime)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(writer);
    if json { layer.json().boxed() } else { layer.compact().boxed() }
}

/// Non-blocking file layer; `None` (after a warning) when the file cannot be opened.
fn file_layer(path: &Path, json: bool) -> Option<(BoxedLayer, WorkerGuard)> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            Some((fmt_layer(writer, json), guard))
        }
        Err(e) => {
            out::print_warn(&format!(
                "File logging to '{}' is disabled ({e}); logs continue on stderr.",
                path.display()
            ));
            if let Some(def) = default_log_path() {
                out::print_warn(&format!("The default log location is {}", def.display()));
            }
            None
        }
    }
}

/// Install the global subscriber. The returned guard, when present, must be
/// held until exit so buffered file output is flushed.
pub fn init_tracing(lvl: &LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(io::stderr, json)];
    let mut guard = None;
    if let Some((layer, g)) = log_file.and_then(|p| file_layer(p, json)) {
        layers.push(layer);
        guard = Some(g);
    }

    let filter = EnvFilter::default().add_directive(level_filter(lvl).into());
    registry().with(layers).with(filter).try_init()?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_one_step_louder() {
        assert_eq!(level_filter(&LogLevel::Quiet), LevelFilter::ERROR);
        assert_eq!(level_filter(&LogLevel::Normal), LevelFilter::INFO);
        assert_eq!(level_filter(&LogLevel::Info), LevelFilter::DEBUG);
        assert_eq!(level_filter(&LogLevel::Debug), LevelFilter::TRACE);
    }
}
