//! Copy and move between stores.
//!
//! Both operations start with an identity check: when source and destination
//! are the same file (a case-only rename, two spellings through a symlink),
//! copy does nothing and move never deletes or truncates anything.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::config;
use crate::delete;
use crate::errors::{ErrorKind, Result, StoreError};
use crate::helpers::is_absent;
use crate::info::{FileInfo, Options};
use crate::io_copy::{self, StreamError};
use crate::progress::{InfiniteProgress, NullProgress, ProgressMonitor, TOTAL_TICKS};
use crate::store::{exists_no_follow, LocalFileStore};

/// OS identity check. A missing side means "not the same file".
pub(crate) fn is_same_file(a: &Path, b: &Path) -> io::Result<bool> {
    if !exists_no_follow(a) || !exists_no_follow(b) {
        return Ok(false);
    }
    match same_node(a, b) {
        Err(e) if is_absent(&e) => Ok(false),
        other => other,
    }
}

/// Device and inode from `stat`; nothing is opened, so FIFOs and unreadable
/// files compare without blocking or failing.
#[cfg(unix)]
fn same_node(a: &Path, b: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    let (ma, mb) = (fs::metadata(a)?, fs::metadata(b)?);
    Ok(ma.dev() == mb.dev() && ma.ino() == mb.ino())
}

#[cfg(not(unix))]
fn same_node(a: &Path, b: &Path) -> io::Result<bool> {
    same_file::is_same_file(a, b)
}

pub(crate) fn copy(
    src: &LocalFileStore,
    dst: &LocalFileStore,
    options: Options,
    monitor: &dyn ProgressMonitor,
) -> Result<()> {
    let same = is_same_file(src.as_path(), dst.as_path())
        .map_err(|e| StoreError::io(ErrorKind::Read, src.as_path(), format!("Could not read file: {src}"), e))?;
    if same {
        debug!(src = %src, dst = %dst, "source and destination are the same file; nothing to copy");
        return Ok(());
    }
    let progress = InfiniteProgress::new(monitor);
    progress.begin_task(&format!("Copying {src}"), TOTAL_TICKS);
    let result = copy_entry(src, dst, options, &progress);
    progress.done();
    result
}

fn copy_entry(
    src: &LocalFileStore,
    dst: &LocalFileStore,
    options: Options,
    progress: &dyn ProgressMonitor,
) -> Result<()> {
    if progress.is_canceled() {
        return Err(StoreError::Canceled);
    }
    progress.sub_task(&src.to_string());
    progress.worked(1);

    let info = src.fetch_info();
    if !info.exists {
        return Err(StoreError::new(
            ErrorKind::NotExists,
            src.as_path(),
            format!("File not found: {src}"),
        ));
    }
    if info.is_directory {
        copy_directory(src, &info, dst, options, progress)
    } else {
        copy_file(src, &info, dst, options)
    }
}

fn copy_directory(
    src: &LocalFileStore,
    info: &FileInfo,
    dst: &LocalFileStore,
    options: Options,
    progress: &dyn ProgressMonitor,
) -> Result<()> {
    if src.is_parent_of(dst) {
        return Err(StoreError::new(
            ErrorKind::Write,
            dst.as_path(),
            format!("Cannot copy {src} into its own subtree {dst}"),
        ));
    }
    let existing = dst.fetch_info();
    if existing.exists && !existing.is_directory {
        return Err(if options.contains(Options::OVERWRITE) {
            StoreError::new(ErrorKind::WrongType, dst.as_path(), format!("Resource is not a directory: {dst}"))
        } else {
            StoreError::new(ErrorKind::Exists, dst.as_path(), format!("File already exists: {dst}"))
        });
    }

    dst.mkdir(Options::SHALLOW)?;
    for child in src.list_children()? {
        copy_entry(&child, &dst.child(&child.name()), options, progress)?;
    }
    transfer_attributes(info, dst)
}

fn copy_file(src: &LocalFileStore, info: &FileInfo, dst: &LocalFileStore, options: Options) -> Result<()> {
    let existing = dst.fetch_info();
    if existing.exists {
        if !options.contains(Options::OVERWRITE) {
            return Err(StoreError::new(
                ErrorKind::Exists,
                dst.as_path(),
                format!("File already exists: {dst}"),
            ));
        }
        if existing.is_directory {
            return Err(StoreError::new(
                ErrorKind::WrongType,
                dst.as_path(),
                format!("Resource is not a file: {dst}"),
            ));
        }
    }

    let threshold = config::active().large_file_threshold;
    if info.length >= threshold {
        debug!(src = %src, dst = %dst, length = info.length, "bulk copy");
        io_copy::copy_bulk(src.as_path(), dst.as_path()).map_err(|e| {
            if exists_no_follow(src.as_path()) { dst.write_error(e) } else { src.read_error(e) }
        })?;
    } else {
        debug!(src = %src, dst = %dst, length = info.length, "streaming copy");
        let input = src.open_input_stream()?;
        let output = dst.open_output_stream(false)?;
        io_copy::copy_streaming(input, output).map_err(|e| match e {
            StreamError::Read(e) => src.read_error(e),
            StreamError::Write(e) => dst.write_error(e),
        })?;
    }
    transfer_attributes(info, dst)
}

fn transfer_attributes(info: &FileInfo, dst: &LocalFileStore) -> Result<()> {
    dst.put_info(info, Options::SET_ATTRIBUTES | Options::SET_LAST_MODIFIED)
}

pub(crate) fn move_to(
    src: &LocalFileStore,
    dst: &LocalFileStore,
    options: Options,
    monitor: &dyn ProgressMonitor,
) -> Result<()> {
    monitor.begin_task(&format!("Moving {src}"), 10);
    let result = move_inner(src, dst, options, monitor);
    monitor.done();
    result
}

fn move_inner(
    src: &LocalFileStore,
    dst: &LocalFileStore,
    options: Options,
    monitor: &dyn ProgressMonitor,
) -> Result<()> {
    if monitor.is_canceled() {
        return Err(StoreError::Canceled);
    }
    let same = is_same_file(src.as_path(), dst.as_path())
        .map_err(|e| StoreError::io(ErrorKind::Write, src.as_path(), format!("Could not move {src}"), e))?;
    let overwrite = options.contains(Options::OVERWRITE);
    if !same && !overwrite && exists_no_follow(dst.as_path()) {
        return Err(StoreError::new(
            ErrorKind::Exists,
            dst.as_path(),
            format!("File already exists: {dst}"),
        ));
    }

    match fs::rename(src.as_path(), dst.as_path()) {
        Ok(()) => {
            if !same && exists_no_follow(src.as_path()) {
                if exists_no_follow(dst.as_path()) {
                    warn!(src = %src, dst = %dst, "rename reported success but left both paths; removing destination");
                    if let Err(e) = delete::delete_tree(dst.as_path(), &NullProgress::new()) {
                        warn!(dst = %dst, error = %e, "could not clean up destination");
                    }
                    return Err(StoreError::new(
                        ErrorKind::Delete,
                        src.as_path(),
                        format!("Could not delete: {src}"),
                    ));
                }
                debug!(src = %src, dst = %dst, "rename left the source in place; falling back to copy");
            } else {
                if !exists_no_follow(dst.as_path()) {
                    return Err(StoreError::new(
                        ErrorKind::Write,
                        dst.as_path(),
                        format!("Failed to move {src} to {dst}"),
                    ));
                }
                monitor.worked(10);
                return Ok(());
            }
        }
        Err(e) => {
            if same {
                return Err(StoreError::io(ErrorKind::Write, src.as_path(), format!("Could not move {src}"), e));
            }
            debug!(src = %src, dst = %dst, error = %e, "rename failed; falling back to copy and delete");
        }
    }

    let copy_options = if overwrite { Options::OVERWRITE } else { Options::NONE };
    copy(src, dst, copy_options, monitor)?;
    delete::delete_tree(src.as_path(), monitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_paths_are_not_same() {
        let td = tempdir().unwrap();
        assert!(!is_same_file(&td.path().join("a"), &td.path().join("b")).unwrap());
        assert!(is_same_file(td.path(), td.path()).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn failed_identity_check_is_classified_per_operation() {
        let td = tempdir().unwrap();
        let looped = td.path().join("loop");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();
        let src = LocalFileStore::new(&looped);
        let dst = LocalFileStore::new(td.path().join("dst"));
        dst.write(b"keep", false).unwrap();

        assert!(is_same_file(&looped, dst.as_path()).is_err());
        assert_eq!(src.copy(&dst, Options::OVERWRITE).unwrap_err().kind(), ErrorKind::Read);
        assert_eq!(src.move_to(&dst, Options::OVERWRITE).unwrap_err().kind(), ErrorKind::Write);
        assert_eq!(dst.read_all_bytes().unwrap(), b"keep");
    }

    #[test]
    fn copy_of_missing_source_is_not_exists() {
        let td = tempdir().unwrap();
        let src = LocalFileStore::new(td.path().join("none"));
        let dst = LocalFileStore::new(td.path().join("out"));
        let err = src.copy(&dst, Options::NONE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotExists);
    }

    #[test]
    fn copy_into_own_subtree_is_refused() {
        let td = tempdir().unwrap();
        let src = LocalFileStore::new(td.path().join("d"));
        src.mkdir(Options::NONE).unwrap();
        let err = src.copy(&src.child("inner"), Options::NONE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert!(!src.child("inner").as_path().exists());
    }

    #[test]
    fn move_refuses_existing_destination() {
        let td = tempdir().unwrap();
        let src = LocalFileStore::new(td.path().join("a"));
        let dst = LocalFileStore::new(td.path().join("b"));
        src.write(b"1", false).unwrap();
        dst.write(b"2", false).unwrap();
        let err = src.move_to(&dst, Options::NONE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exists);
        assert_eq!(dst.read_all_bytes().unwrap(), b"2");
        src.move_to(&dst, Options::OVERWRITE).unwrap();
        assert_eq!(dst.read_all_bytes().unwrap(), b"1");
        assert!(!src.as_path().exists());
    }
}
