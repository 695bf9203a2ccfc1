//! Core library for `localfs`.
//!
//! A uniform, attribute-rich view of the local filesystem. Callers build a
//! [`LocalFileStore`] for a path and use it to query and update metadata,
//! stream content, create directories, delete whole trees and copy or move
//! with same-file detection. Attribute work goes through the native provider
//! selected once per process (see [`native`]).

pub mod cancel;
pub mod capabilities;
pub mod cli;
pub mod config;
mod delete;
pub mod errors;
pub mod helpers;
pub mod info;
pub mod io_copy;
pub mod native;
pub mod output;
pub mod progress;
pub mod store;
mod transfer;

pub use cancel::CancelToken;
pub use capabilities::{capabilities, is_supported};
pub use config::{Config, LogLevel, default_config_path, default_log_path};
pub use errors::{ErrorKind, Result, StoreError};
pub use info::{Attributes, FileInfo, LAST_MODIFIED_UNKNOWN, Options};
pub use native::NativeProvider;
pub use progress::{InfiniteProgress, NullProgress, ProgressMonitor};
pub use store::LocalFileStore;
