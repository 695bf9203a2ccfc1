//! `LocalFileStore`: one absolute path on the local filesystem.
//!
//! The store holds nothing but the path. Metadata is fetched fresh on every
//! call and navigation is pure path algebra. Equality, hashing and ordering
//! use the lexically normalized path, compared segment by segment and
//! case-insensitively on platforms whose default filesystems are.

use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use filetime::FileTime;
use tracing::{debug, warn};

use crate::delete;
use crate::errors::{ErrorKind, Result, StoreError};
use crate::helpers::{is_absent, is_access_denied};
use crate::info::{Attributes, FileInfo, LAST_MODIFIED_UNKNOWN, Options};
use crate::native::{self, base_name};
use crate::progress::{NullProgress, ProgressMonitor};
use crate::transfer;

const CASE_INSENSITIVE: bool = cfg!(any(windows, target_os = "macos"));

#[derive(Debug, Clone)]
pub struct LocalFileStore {
    path: PathBuf,
}

impl LocalFileStore {
    /// Store for `path`, made absolute against the current directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        LocalFileStore { path: dunce::simplified(&absolute).to_path_buf() }
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Last path segment; empty for a filesystem root.
    pub fn name(&self) -> String {
        base_name(&self.path)
    }

    /// Store for `name` below this one. `name` is always appended: a leading
    /// root or drive prefix is dropped rather than replacing the base.
    pub fn child(&self, name: &str) -> LocalFileStore {
        let mut path = self.path.clone();
        for comp in Path::new(name).components() {
            if !matches!(comp, Component::Prefix(_) | Component::RootDir) {
                path.push(comp);
            }
        }
        LocalFileStore { path }
    }

    /// `None` for a filesystem root.
    pub fn parent(&self) -> Option<LocalFileStore> {
        self.path.parent().map(|p| LocalFileStore { path: p.to_path_buf() })
    }

    /// Store for `relative` resolved against this one; `.` and `..` are
    /// collapsed lexically.
    pub fn file_store(&self, relative: impl AsRef<Path>) -> LocalFileStore {
        LocalFileStore { path: normalize_lexically(&self.path.join(relative)) }
    }

    /// True when `other` lies strictly below this store.
    pub fn is_parent_of(&self, other: &LocalFileStore) -> bool {
        let mine = self.key();
        let theirs = other.key();
        theirs.len() > mine.len() && theirs.starts_with(&mine)
    }

    /// Names of the entries in this directory, sorted. Empty when the store is
    /// not a readable directory.
    pub fn child_names(&self) -> Vec<String> {
        match self.list_names() {
            Ok(names) => names,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "could not list directory");
                Vec::new()
            }
        }
    }

    pub fn child_stores(&self) -> Vec<LocalFileStore> {
        self.child_names().iter().map(|n| self.child(n)).collect()
    }

    pub fn child_infos(&self) -> Vec<FileInfo> {
        self.child_stores().iter().map(LocalFileStore::fetch_info).collect()
    }

    fn list_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Children for tree operations; a listing failure is a read error.
    pub(crate) fn list_children(&self) -> Result<Vec<LocalFileStore>> {
        let names = self.list_names().map_err(|e| {
            StoreError::io(ErrorKind::Read, &self.path, format!("Could not read directory: {self}"), e)
        })?;
        Ok(names.iter().map(|n| self.child(n)).collect())
    }

    /// Current metadata. An empty native name falls back to the path's base name.
    pub fn fetch_info(&self) -> FileInfo {
        let mut info = native::provider().fetch_file_info(&self.path);
        if info.name.is_empty() {
            info.name = self.name();
        }
        info
    }

    /// Write the parts of `info` selected by `options`: `SET_LAST_MODIFIED`
    /// and/or `SET_ATTRIBUTES`. Unsupported attribute bits are ignored.
    pub fn put_info(&self, info: &FileInfo, options: Options) -> Result<()> {
        let mut success = true;
        if options.contains(Options::SET_LAST_MODIFIED) {
            success &= self.set_last_modified(info.last_modified);
        }
        if options.contains(Options::SET_ATTRIBUTES) {
            success &= native::provider().put_file_info(&self.path, info, options);
        }
        if !success {
            if !exists_no_follow(&self.path) {
                return Err(StoreError::new(
                    ErrorKind::NotExists,
                    &self.path,
                    format!("File not found: {self}"),
                ));
            }
            warn!(path = %self.path.display(), "could not apply every requested attribute");
        }
        Ok(())
    }

    fn set_last_modified(&self, millis: i64) -> bool {
        if millis == LAST_MODIFIED_UNKNOWN {
            return true;
        }
        let secs = millis.div_euclid(1000);
        let nanos = (millis.rem_euclid(1000) * 1_000_000) as u32;
        match filetime::set_file_mtime(&self.path, FileTime::from_unix_time(secs, nanos)) {
            Ok(()) => true,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "could not set modification time");
                false
            }
        }
    }

    pub fn open_input_stream(&self) -> Result<File> {
        let file = File::open(&self.path).map_err(|e| self.read_error(e))?;
        // Directories open fine on Unix; reading them is what fails.
        match file.metadata() {
            Ok(m) if m.is_dir() => Err(StoreError::new(
                ErrorKind::WrongType,
                &self.path,
                format!("Resource is not a file: {self}"),
            )),
            _ => Ok(file),
        }
    }

    pub fn read_all_bytes(&self) -> Result<Vec<u8>> {
        let mut file = self.open_input_stream()?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(|e| self.read_error(e))?;
        Ok(buf)
    }

    /// Open for writing, creating the file. `append` keeps existing content,
    /// otherwise the file is truncated.
    pub fn open_output_stream(&self, append: bool) -> Result<File> {
        let mut opts = OpenOptions::new();
        opts.write(true).create(true);
        if append {
            opts.append(true);
        } else {
            opts.truncate(true);
        }
        opts.open(&self.path).map_err(|e| self.write_error(e))
    }

    pub fn write(&self, bytes: &[u8], append: bool) -> Result<()> {
        let mut file = self.open_output_stream(append)?;
        file.write_all(bytes).map_err(|e| self.write_error(e))?;
        file.flush().map_err(|e| self.write_error(e))
    }

    /// Create this directory. With `SHALLOW` only the last segment is created
    /// and its parent must exist; otherwise every missing ancestor is created.
    /// An existing directory is not an error.
    pub fn mkdir(&self, options: Options) -> Result<()> {
        let shallow = options.contains(Options::SHALLOW);
        let res = if shallow { fs::create_dir(&self.path) } else { fs::create_dir_all(&self.path) };
        let err = match res {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && self.path.is_dir() => return Ok(()),
            Err(e) => e,
        };
        debug!(path = %self.path.display(), shallow, error = %err, "mkdir failed");

        if let Some(blocker) = first_non_directory(&self.path) {
            return Err(StoreError::io(
                ErrorKind::WrongType,
                &blocker,
                format!("A file exists where a directory is required: {}", blocker.display()),
                err,
            ));
        }
        if is_absent(&err) {
            let parent = self.path.parent().unwrap_or(&self.path);
            return Err(StoreError::io(
                ErrorKind::NotExists,
                parent,
                format!("Parent directory does not exist: {}", parent.display()),
                err,
            ));
        }
        if self.parent_is_read_only() {
            return Err(self.parent_read_only_error(err));
        }
        if is_access_denied(&err) {
            return Err(StoreError::io(
                ErrorKind::AuthFailed,
                &self.path,
                format!("Access denied creating directory: {self}"),
                err,
            ));
        }
        Err(StoreError::io(
            ErrorKind::Write,
            &self.path,
            format!("Could not create directory: {self}"),
            err,
        ))
    }

    /// Delete this node and everything below it. Deleting a missing path succeeds.
    pub fn delete(&self) -> Result<()> {
        self.delete_with(&NullProgress::new())
    }

    pub fn delete_with(&self, monitor: &dyn ProgressMonitor) -> Result<()> {
        delete::delete_tree(&self.path, monitor)
    }

    /// Copy this file or directory tree to `dest`. `OVERWRITE` allows replacing
    /// existing destination files.
    pub fn copy(&self, dest: &LocalFileStore, options: Options) -> Result<()> {
        self.copy_with(dest, options, &NullProgress::new())
    }

    pub fn copy_with(&self, dest: &LocalFileStore, options: Options, monitor: &dyn ProgressMonitor) -> Result<()> {
        transfer::copy(self, dest, options, monitor)
    }

    /// Move to `dest`: native rename first, copy then delete when that fails.
    pub fn move_to(&self, dest: &LocalFileStore, options: Options) -> Result<()> {
        self.move_with(dest, options, &NullProgress::new())
    }

    pub fn move_with(&self, dest: &LocalFileStore, options: Options, monitor: &dyn ProgressMonitor) -> Result<()> {
        transfer::move_to(self, dest, options, monitor)
    }

    /// Total order over normalized paths.
    pub fn compare_to(&self, other: &LocalFileStore) -> Ordering {
        self.key().cmp(&other.key())
    }

    pub(crate) fn read_error(&self, e: io::Error) -> StoreError {
        match fs::metadata(&self.path) {
            Err(me) if is_absent(&me) => {
                StoreError::io(ErrorKind::NotExists, &self.path, format!("File not found: {self}"), e)
            }
            Ok(m) if m.is_dir() => {
                StoreError::io(ErrorKind::WrongType, &self.path, format!("Resource is not a file: {self}"), e)
            }
            _ => StoreError::io(ErrorKind::Read, &self.path, format!("Could not read file: {self}"), e),
        }
    }

    pub(crate) fn write_error(&self, e: io::Error) -> StoreError {
        if self.parent_is_read_only() {
            return self.parent_read_only_error(e);
        }
        if self.path.is_dir() {
            return StoreError::io(ErrorKind::WrongType, &self.path, format!("Resource is not a file: {self}"), e);
        }
        StoreError::io(ErrorKind::Write, &self.path, format!("Could not write file: {self}"), e)
    }

    fn parent_is_read_only(&self) -> bool {
        self.path.parent().is_some_and(|p| {
            let info = native::provider().fetch_file_info(p);
            info.exists && info.attribute(Attributes::READ_ONLY)
        })
    }

    fn parent_read_only_error(&self, e: io::Error) -> StoreError {
        StoreError::io(
            ErrorKind::ParentReadOnly,
            &self.path,
            format!("Parent of resource is marked as read-only: {self}"),
            e,
        )
    }

    fn key(&self) -> Vec<String> {
        normalize_lexically(&self.path)
            .components()
            .map(|c| {
                let s = c.as_os_str().to_string_lossy();
                if CASE_INSENSITIVE { s.to_lowercase() } else { s.into_owned() }
            })
            .collect()
    }
}

impl fmt::Display for LocalFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl PartialEq for LocalFileStore {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for LocalFileStore {}

impl Hash for LocalFileStore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for LocalFileStore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalFileStore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
    }
}

/// Collapse `.`, `..` and repeated separators without touching the filesystem.
/// `..` at the root stays at the root.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

pub(crate) fn exists_no_follow(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Deepest existing ancestor-or-self of `path` that is not a directory.
fn first_non_directory(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|p| exists_no_follow(p))
        .filter(|p| !p.is_dir())
        .map(Path::to_path_buf)
}
