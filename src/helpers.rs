//! I/O helper utilities.
//!
//! Turns raw `io::Error`s into actionable text (platform-aware hints keyed on the
//! OS error code) and classifies the handful of conditions the store branches on.
//!
//! Usage:
//!   let msg = format!("Could not read {}: {}", path.display(), describe_io_error(&e));
//!   if is_absent(&e) { /* treat as "does not exist" */ }

use std::io;

/// Human-friendly description of `e` with a hint and the OS code when known.
pub fn describe_io_error(e: &io::Error) -> String {
    let mut msg = e.to_string();

    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            match code {
                libc::EACCES | libc::EPERM => {
                    msg.push_str("; permission denied, check ownership and write permissions");
                }
                libc::EXDEV => {
                    msg.push_str("; cross-filesystem, atomic rename not possible");
                }
                libc::EBUSY => {
                    msg.push_str("; resource busy, ensure no other process holds it");
                }
                libc::ENOENT => {
                    msg.push_str("; path not found, verify it exists");
                }
                libc::EEXIST => {
                    msg.push_str("; already exists, pick another name or remove the target");
                }
                libc::ENOTEMPTY => {
                    msg.push_str("; directory not empty");
                }
                libc::ENOSPC => {
                    msg.push_str("; insufficient space on device");
                }
                libc::EROFS => {
                    msg.push_str("; read-only filesystem, cannot write here");
                }
                libc::ELOOP => {
                    msg.push_str("; too many symbolic link levels, possible symlink cycle");
                }
                libc::ENAMETOOLONG => {
                    msg.push_str("; filename or path too long, shorten path segments");
                }
                libc::EMFILE => {
                    msg.push_str("; process file descriptor limit reached");
                }
                _ => {}
            }
        }
        #[cfg(windows)]
        {
            match code {
                5 => msg.push_str("; access denied, check permissions and the read-only attribute"), // ERROR_ACCESS_DENIED
                17 => msg.push_str("; not same device, cross-volume move"),       // ERROR_NOT_SAME_DEVICE
                32 => msg.push_str("; sharing violation, file is in use"),        // ERROR_SHARING_VIOLATION
                2 | 3 => msg.push_str("; path not found, verify it exists"),      // FILE/PATH NOT FOUND
                80 | 183 => msg.push_str("; already exists, pick another name"),  // ERROR_FILE_EXISTS / ERROR_ALREADY_EXISTS
                112 => msg.push_str("; insufficient disk space"),                 // ERROR_DISK_FULL
                145 => msg.push_str("; directory not empty"),                     // ERROR_DIR_NOT_EMPTY
                19 => msg.push_str("; write protected media"),                    // ERROR_WRITE_PROTECT
                206 => msg.push_str("; filename or path too long"),               // ERROR_FILENAME_EXCED_RANGE
                _ => {}
            }
        }
        msg.push_str(&format!(" [os code: {code}]"));
    } else {
        match e.kind() {
            io::ErrorKind::PermissionDenied => {
                msg.push_str("; permission denied, check ownership and write permissions");
            }
            io::ErrorKind::NotFound => {
                msg.push_str("; path not found, verify it exists");
            }
            io::ErrorKind::AlreadyExists => {
                msg.push_str("; already exists, remove it or choose another name");
            }
            _ => {}
        }
    }

    msg
}

/// True when the error means "nothing there" rather than a genuine failure.
/// A non-directory in the middle of the path counts as absence, like a missing parent.
pub fn is_absent(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

/// True when a directory removal failed because it still has entries.
pub fn is_dir_not_empty(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::DirectoryNotEmpty {
        return true;
    }
    #[cfg(unix)]
    {
        // Some Unixes report EEXIST from rmdir on a populated directory.
        if let Some(code) = e.raw_os_error() {
            return code == libc::ENOTEMPTY || code == libc::EEXIST;
        }
    }
    false
}

pub fn is_access_denied(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::PermissionDenied
}
