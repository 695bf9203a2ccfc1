//! User-facing output for the binary.
//! Colored prefixes when stdout is a TTY, plain text otherwise, and JSON
//! rendering for `--json`.

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::errors::StoreError;
use crate::info::FileInfo;

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain user-facing line (no prefix), for output users may script against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Print `value` as one line of JSON.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => print_error(&format!("could not render JSON: {e}")),
    }
}

/// One-line listing entry: type marker, length, mtime, attributes, name.
pub fn format_entry(info: &FileInfo) -> String {
    let kind = if !info.exists {
        '?'
    } else if info.is_directory {
        'd'
    } else {
        '-'
    };
    let mtime = chrono::DateTime::from_timestamp_millis(info.last_modified)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!("{kind} {:>12} {mtime} {:<24} {}", info.length, info.attributes.to_string(), info.name);
    if let Some(target) = &info.link_target {
        line.push_str(" -> ");
        line.push_str(target);
    }
    line
}

/// Multi-line description of a failure, one line per leaf of an aggregate.
pub fn describe_error(e: &StoreError) -> String {
    let mut out = format!("[{}] {}", e.kind(), e);
    if !e.children().is_empty() {
        for leaf in e.leaves() {
            out.push_str(&format!("\n  [{}] {}", leaf.kind(), leaf));
        }
    }
    out
}
