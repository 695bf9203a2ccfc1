//! POSIX provider: `lstat`/`stat` plus the user permission bits.
//!
//! READ_ONLY maps to a clear owner-write bit, EXECUTABLE to the owner-execute
//! bit. Symbolic links are reported with the metadata of their target; a
//! dangling link still exists and carries SYMLINK.

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use tracing::debug;

use crate::errors::ErrorKind;
use crate::helpers::is_absent;
use crate::info::{system_time_to_millis, Attributes, FileInfo, LAST_MODIFIED_UNKNOWN};

use super::base_name;

const OWNER_WRITE: u32 = 0o200;
const OWNER_EXEC: u32 = 0o100;
const ANY_WRITE: u32 = 0o222;

pub(super) fn fetch_file_info(path: &Path) -> FileInfo {
    let mut info = FileInfo::new(base_name(path));
    let link_meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if is_absent(&e) => return info,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "lstat failed");
            info.error = Some(ErrorKind::IoError);
            return info;
        }
    };

    let meta = if link_meta.file_type().is_symlink() {
        info.set_attribute(Attributes::SYMLINK, true);
        match fs::read_link(path) {
            Ok(target) => info.link_target = Some(target.to_string_lossy().into_owned()),
            Err(e) => debug!(path = %path.display(), error = %e, "readlink failed"),
        }
        // Dangling links are described by the link itself.
        fs::metadata(path).unwrap_or(link_meta)
    } else {
        link_meta
    };

    info.exists = true;
    info.is_directory = meta.is_dir();
    info.length = if meta.is_dir() { 0 } else { meta.len() };
    info.last_modified = meta
        .modified()
        .map(system_time_to_millis)
        .unwrap_or(LAST_MODIFIED_UNKNOWN);
    let mode = meta.mode();
    info.set_attribute(Attributes::READ_ONLY, mode & OWNER_WRITE == 0);
    info.set_attribute(Attributes::EXECUTABLE, mode & OWNER_EXEC != 0);
    info
}

pub(super) fn put_attributes(path: &Path, attrs: Attributes, caps: Attributes) -> bool {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "stat failed before chmod");
            return false;
        }
    };
    let mode = meta.permissions().mode();
    let mut updated = mode;
    if caps.contains(Attributes::READ_ONLY) {
        if attrs.contains(Attributes::READ_ONLY) {
            updated &= !ANY_WRITE;
        } else {
            updated |= OWNER_WRITE;
        }
    }
    if caps.contains(Attributes::EXECUTABLE) {
        if attrs.contains(Attributes::EXECUTABLE) {
            updated |= OWNER_EXEC;
        } else {
            updated &= !OWNER_EXEC;
        }
    }
    if updated == mode {
        return true;
    }
    match fs::set_permissions(path, fs::Permissions::from_mode(updated)) {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, mode = format_args!("{updated:o}"), "chmod failed");
            false
        }
    }
}
