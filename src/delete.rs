//! Recursive delete engine.
//!
//! Each node is first removed directly. A non-empty directory fans its children
//! out to the delete pool and waits for all of them before retrying itself, so
//! a parent's second attempt always follows its children's. Child failures do
//! not stop siblings; they are gathered into one `StoreError::Multi`.
//!
//! Rayon's per-worker deques run freshly spawned work last-in first-out, which
//! keeps the walk depth first. Past `PARALLEL_DEPTH` levels a subtree is walked
//! sequentially with a heap stack, so arbitrarily deep chains cannot overflow
//! a worker's stack.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace, warn};

use crate::config;
use crate::errors::{ErrorKind, Result, StoreError};
use crate::helpers::{is_absent, is_access_denied, is_dir_not_empty};
use crate::info::Attributes;
use crate::native::{self, clear_read_only};
use crate::progress::{InfiniteProgress, ProgressMonitor, TOTAL_TICKS};

/// Directory depth below which children are fanned out to the pool. Deeper
/// subtrees are deleted sequentially so the recursion stays bounded.
const PARALLEL_DEPTH: usize = 64;

static POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

fn pool() -> Option<&'static ThreadPool> {
    POOL.get_or_init(|| {
        let threads = config::active().effective_delete_threads();
        match ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("localfs-deleter-{i}"))
            .build()
        {
            Ok(pool) => {
                debug!(threads, "Started delete pool");
                Some(pool)
            }
            Err(e) => {
                warn!(error = %e, "Could not start delete pool; using the global pool");
                None
            }
        }
    })
    .as_ref()
}

/// Delete `path` and everything below it. A missing path is success.
pub(crate) fn delete_tree(path: &Path, monitor: &dyn ProgressMonitor) -> Result<()> {
    let progress = InfiniteProgress::new(monitor);
    progress.begin_task(&format!("Deleting {}", path.display()), TOTAL_TICKS);
    let run = || delete_node(path, &progress, 0);
    let result = match pool() {
        Some(pool) => pool.install(run),
        None => run(),
    };
    progress.done();
    result
}

fn delete_node(path: &Path, progress: &dyn ProgressMonitor, depth: usize) -> Result<()> {
    if depth >= PARALLEL_DEPTH {
        return delete_chain(path, progress);
    }
    if let Removal::Done = remove_node(path, progress)? {
        return Ok(());
    }

    let children = list_children(path)?;
    debug!(path = %path.display(), children = children.len(), "deleting children");
    let results: Vec<Result<()>> = children
        .par_iter()
        .map(|child| delete_node(child, progress, depth + 1))
        .collect();

    let mut failures = Vec::new();
    for r in results {
        match r {
            Ok(()) => {}
            Err(StoreError::Canceled) => return Err(StoreError::Canceled),
            Err(e) => failures.push(e),
        }
    }
    finish_directory(path, failures, progress)
}

/// A directory whose children are still being removed.
struct Pending {
    path: PathBuf,
    children: Vec<PathBuf>,
    failures: Vec<StoreError>,
}

/// Sequential post-order delete of the subtree at `root`, driven by an
/// explicit stack so nesting depth never grows the thread stack.
fn delete_chain(root: &Path, progress: &dyn ProgressMonitor) -> Result<()> {
    if let Removal::Done = remove_node(root, progress)? {
        return Ok(());
    }
    trace!(path = %root.display(), "deep subtree; deleting sequentially");
    let mut stack = vec![Pending {
        path: root.to_path_buf(),
        children: list_children(root)?,
        failures: Vec::new(),
    }];

    loop {
        let Some(top) = stack.last_mut() else {
            return Ok(());
        };
        if let Some(child) = top.children.pop() {
            let outcome = remove_node(&child, progress).and_then(|removal| match removal {
                Removal::Done => Ok(None),
                Removal::NotEmpty => list_children(&child).map(Some),
            });
            match outcome {
                Ok(None) => {}
                Ok(Some(children)) => stack.push(Pending { path: child, children, failures: Vec::new() }),
                Err(StoreError::Canceled) => return Err(StoreError::Canceled),
                Err(e) => {
                    if let Some(top) = stack.last_mut() {
                        top.failures.push(e);
                    }
                }
            }
            continue;
        }

        let Some(done) = stack.pop() else {
            return Ok(());
        };
        let result = finish_directory(&done.path, done.failures, progress);
        match (stack.last_mut(), result) {
            (None, result) => return result,
            (Some(_), Ok(())) => {}
            (Some(_), Err(StoreError::Canceled)) => return Err(StoreError::Canceled),
            (Some(parent), Err(e)) => parent.failures.push(e),
        }
    }
}

enum Removal {
    Done,
    NotEmpty,
}

/// First attempt on one node. A read-only node is made writable and retried;
/// a non-empty directory is made writable so its entries can be unlinked.
fn remove_node(path: &Path, progress: &dyn ProgressMonitor) -> Result<Removal> {
    if progress.is_canceled() {
        return Err(StoreError::Canceled);
    }
    progress.sub_task(&path.display().to_string());
    progress.worked(1);

    let mut err = match delete_if_exists(path) {
        Ok(()) => return Ok(Removal::Done),
        Err(e) => e,
    };

    if is_access_denied(&err) && is_read_only(path) {
        trace!(path = %path.display(), "clearing read-only flag before retry");
        match clear_read_only(path) {
            Ok(()) => match delete_if_exists(path) {
                Ok(()) => return Ok(Removal::Done),
                Err(e) => err = e,
            },
            Err(e) => debug!(path = %path.display(), error = %e, "could not clear read-only flag"),
        }
    }

    if !is_dir_not_empty(&err) {
        return Err(delete_failure(path, err));
    }

    if is_read_only(path) {
        if let Err(e) = clear_read_only(path) {
            debug!(path = %path.display(), error = %e, "could not make directory writable");
        }
    }
    Ok(Removal::NotEmpty)
}

/// Second attempt on a directory once all its children have been handled.
fn finish_directory(path: &Path, failures: Vec<StoreError>, progress: &dyn ProgressMonitor) -> Result<()> {
    if !failures.is_empty() {
        return Err(StoreError::multi(path, failures));
    }
    if progress.is_canceled() {
        return Err(StoreError::Canceled);
    }
    delete_if_exists(path).map_err(|e| delete_failure(path, e))
}

fn list_children(path: &Path) -> Result<Vec<PathBuf>> {
    let read = |e: io::Error| {
        StoreError::io(ErrorKind::Delete, path, format!("Could not delete: {}", path.display()), e)
    };
    let mut out = Vec::new();
    for entry in fs::read_dir(path).map_err(read)? {
        out.push(entry.map_err(read)?.path());
    }
    Ok(out)
}

/// Remove a single node without following symlinks. Absence is success.
pub(crate) fn delete_if_exists(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if is_absent(&e) => return Ok(()),
        Err(e) => return Err(e),
    };
    let res = if removes_as_directory(&meta) {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    match res {
        Err(e) if is_absent(&e) => Ok(()),
        other => other,
    }
}

fn removes_as_directory(meta: &fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::FileTypeExt;
        if meta.file_type().is_symlink_dir() {
            return true;
        }
    }
    meta.is_dir()
}

fn is_read_only(path: &Path) -> bool {
    native::provider().fetch_file_info(path).attribute(Attributes::READ_ONLY)
}

fn delete_failure(path: &Path, e: io::Error) -> StoreError {
    let parent_read_only = path.parent().is_some_and(is_read_only);
    if parent_read_only {
        return StoreError::io(
            ErrorKind::ParentReadOnly,
            path,
            format!("Could not delete {}: parent is read-only", path.display()),
            e,
        );
    }
    let message = if is_read_only(path) {
        format!("Could not delete read-only resource: {}", path.display())
    } else {
        format!("Could not delete: {}", path.display())
    };
    StoreError::io(ErrorKind::Delete, path, message, e)
}
