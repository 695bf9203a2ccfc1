//! Windows provider: `FindFirstFileW` for metadata and
//! `GetFileAttributesW`/`SetFileAttributesW` for the DOS bits.
//!
//! Every path is passed in long (`\\?\`) form so the MAX_PATH limit does not
//! apply.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use tracing::debug;
use windows_sys::Win32::Storage::FileSystem::{
    FindClose, FindFirstFileW, GetFileAttributesW, SetFileAttributesW, INVALID_FILE_ATTRIBUTES,
    WIN32_FIND_DATAW,
};
use windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE;

use crate::errors::ErrorKind;
use crate::helpers::is_absent;
use crate::info::{Attributes, FileInfo};

use super::base_name;
use super::win32::{self, FILE_ATTRIBUTE_DIRECTORY, RECORD_SIZE};

const _: () = assert!(mem::size_of::<WIN32_FIND_DATAW>() == RECORD_SIZE);

fn to_wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

fn long_path(path: &Path) -> String {
    win32::to_long_path(&path.to_string_lossy())
}

pub(super) fn fetch_file_info(path: &Path) -> FileInfo {
    let mut info = FileInfo::new(String::new());
    let target = long_path(path);

    if win32::is_drive_root(&target) {
        info.exists = path.exists();
        info.is_directory = info.exists;
        return info;
    }

    let wide = to_wide(&target);
    // SAFETY: WIN32_FIND_DATAW is plain data; all-zero is a valid value.
    let mut data: WIN32_FIND_DATAW = unsafe { mem::zeroed() };
    // SAFETY: `wide` is NUL-terminated and `data` outlives the call.
    let handle = unsafe { FindFirstFileW(wide.as_ptr(), &mut data) };
    if handle == INVALID_HANDLE_VALUE {
        let e = io::Error::last_os_error();
        if !is_absent(&e) {
            debug!(path = %path.display(), error = %e, "FindFirstFileW failed");
            info.error = Some(ErrorKind::IoError);
        }
        info.name = base_name(path);
        return info;
    }
    // SAFETY: `handle` came from a successful FindFirstFileW.
    unsafe { FindClose(handle) };

    // SAFETY: reading the struct's own bytes; the size was checked at compile time.
    let bytes = unsafe {
        std::slice::from_raw_parts((&data as *const WIN32_FIND_DATAW).cast::<u8>(), RECORD_SIZE)
    };
    let Some(record) = win32::decode(bytes) else {
        info.error = Some(ErrorKind::IoError);
        return info;
    };

    info.name = record.file_name.clone();
    info.exists = true;
    info.is_directory = record.has(FILE_ATTRIBUTE_DIRECTORY);
    info.length = if info.is_directory { 0 } else { record.length() };
    info.last_modified = record.last_modified_millis();
    info.attributes = record.attribute_bits();
    if record.is_symlink() {
        match fs::read_link(path) {
            Ok(t) => info.link_target = Some(t.to_string_lossy().into_owned()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "could not resolve link target");
                info.error = Some(ErrorKind::IoError);
            }
        }
    }
    info
}

pub(super) fn put_attributes(path: &Path, attrs: Attributes, caps: Attributes) -> bool {
    let wide = to_wide(&long_path(path));
    // SAFETY: `wide` is NUL-terminated.
    let current = unsafe { GetFileAttributesW(wide.as_ptr()) };
    if current == INVALID_FILE_ATTRIBUTES {
        debug!(path = %path.display(), error = %io::Error::last_os_error(), "GetFileAttributesW failed");
        return false;
    }
    let updated = win32::apply_attributes(current, attrs, caps);
    if updated == win32::normalize(current) {
        return true;
    }
    // SAFETY: `wide` is NUL-terminated.
    let ok = unsafe { SetFileAttributesW(wide.as_ptr(), updated) } != 0;
    if !ok {
        debug!(path = %path.display(), error = %io::Error::last_os_error(), "SetFileAttributesW failed");
    }
    ok
}
