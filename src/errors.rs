//! Typed error definitions for localfs.
//! Every store operation fails with a `StoreError` that carries a well-known
//! `ErrorKind`, the offending path and, for tree deletes, every child failure.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::helpers::describe_io_error;

/// Failure categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The path (or a required parent) does not exist.
    NotExists,
    /// Directory found where a file was expected, or the other way round.
    WrongType,
    /// The destination exists and overwrite was not requested.
    Exists,
    Read,
    Write,
    Delete,
    /// The parent directory is marked read-only.
    ParentReadOnly,
    /// Access was denied while creating a node.
    AuthFailed,
    /// Opaque native failure.
    IoError,
    /// The caller's cancellation token fired.
    Canceled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotExists => "not-exists",
            ErrorKind::WrongType => "wrong-type",
            ErrorKind::Exists => "exists",
            ErrorKind::Read => "read",
            ErrorKind::Write => "write",
            ErrorKind::Delete => "delete",
            ErrorKind::ParentReadOnly => "parent-read-only",
            ErrorKind::AuthFailed => "auth-failed",
            ErrorKind::IoError => "io-error",
            ErrorKind::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{message}")]
    Failed {
        kind: ErrorKind,
        path: PathBuf,
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Aggregated failure of a tree delete; one entry per failed child.
    #[error("{message} ({} problem(s) below {})", .children.len(), .path.display())]
    Multi {
        path: PathBuf,
        message: String,
        children: Vec<StoreError>,
    },

    #[error("Operation canceled")]
    Canceled,
}

/// Result alias used across the store API.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn new(kind: ErrorKind, path: &Path, message: impl Into<String>) -> Self {
        StoreError::Failed {
            kind,
            path: path.to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    /// Build an error from a low-level failure; the message gets the OS hint appended.
    pub(crate) fn io(kind: ErrorKind, path: &Path, message: impl Into<String>, err: io::Error) -> Self {
        let message = format!("{}: {}", message.into(), describe_io_error(&err));
        StoreError::Failed {
            kind,
            path: path.to_path_buf(),
            message,
            source: Some(err),
        }
    }

    pub(crate) fn multi(path: &Path, children: Vec<StoreError>) -> Self {
        StoreError::Multi {
            path: path.to_path_buf(),
            message: "Problems encountered while deleting resources".to_string(),
            children,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Failed { kind, .. } => *kind,
            StoreError::Multi { .. } => ErrorKind::Delete,
            StoreError::Canceled => ErrorKind::Canceled,
        }
    }

    /// Path the failure is about (`None` for cancellation).
    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreError::Failed { path, .. } | StoreError::Multi { path, .. } => Some(path),
            StoreError::Canceled => None,
        }
    }

    /// Direct children of an aggregated failure; empty for single failures.
    pub fn children(&self) -> &[StoreError] {
        match self {
            StoreError::Multi { children, .. } => children,
            _ => &[],
        }
    }

    /// Every non-aggregate failure reachable from this error, depth first.
    pub fn leaves(&self) -> Vec<&StoreError> {
        match self {
            StoreError::Multi { children, .. } => children.iter().flat_map(|c| c.leaves()).collect(),
            other => vec![other],
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, StoreError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_flatten_nested_multi() {
        let a = StoreError::new(ErrorKind::Delete, Path::new("/t/a"), "could not delete /t/a");
        let b = StoreError::new(ErrorKind::ParentReadOnly, Path::new("/t/s/b"), "read-only parent");
        let inner = StoreError::multi(Path::new("/t/s"), vec![b]);
        let outer = StoreError::multi(Path::new("/t"), vec![a, inner]);

        assert_eq!(outer.kind(), ErrorKind::Delete);
        assert_eq!(outer.children().len(), 2);
        let leaves: Vec<_> = outer.leaves().iter().map(|e| e.path().unwrap().to_path_buf()).collect();
        assert_eq!(leaves, vec![PathBuf::from("/t/a"), PathBuf::from("/t/s/b")]);
        assert!(outer.to_string().contains("2 problem(s)"));
    }

    #[test]
    fn io_errors_keep_source_and_hint() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        let e = StoreError::io(ErrorKind::NotExists, Path::new("/missing"), "File not found: /missing", err);
        assert_eq!(e.kind(), ErrorKind::NotExists);
        assert!(std::error::Error::source(&e).is_some());
        assert!(e.to_string().starts_with("File not found: /missing"));
    }

    #[test]
    fn canceled_has_no_path() {
        let e = StoreError::Canceled;
        assert!(e.is_canceled());
        assert!(e.path().is_none());
        assert_eq!(e.leaves().len(), 1);
    }
}
