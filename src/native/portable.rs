//! Fallback provider built on `std::fs` alone.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::ErrorKind;
use crate::helpers::is_absent;
use crate::info::{system_time_to_millis, Attributes, FileInfo, LAST_MODIFIED_UNKNOWN};

use super::{base_name, set_read_only};

pub(super) fn fetch_file_info(path: &Path) -> FileInfo {
    let mut info = FileInfo::new(base_name(path));
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if is_absent(&e) => return info,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "metadata lookup failed");
            info.error = Some(ErrorKind::IoError);
            return info;
        }
    };
    info.exists = true;
    info.is_directory = meta.is_dir();
    info.length = if meta.is_dir() { 0 } else { meta.len() };
    info.last_modified = meta
        .modified()
        .map(system_time_to_millis)
        .unwrap_or(LAST_MODIFIED_UNKNOWN);
    info.set_attribute(Attributes::READ_ONLY, meta.permissions().readonly());
    info
}

pub(super) fn put_attributes(path: &Path, attrs: Attributes, caps: Attributes) -> bool {
    if !caps.contains(Attributes::READ_ONLY) {
        return true;
    }
    match set_read_only(path, attrs.contains(Attributes::READ_ONLY)) {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not change read-only state");
            false
        }
    }
}
