//! Native attribute providers.
//!
//! One provider is selected per process: the OS-specific one when it is
//! compiled in and not disabled by configuration, otherwise the portable
//! fallback that only understands the read-only bit.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use tracing::{debug, info};

use crate::capabilities;
use crate::config;
use crate::info::{Attributes, FileInfo, Options};

mod portable;
#[cfg(unix)]
mod posix;
pub mod win32;
#[cfg(windows)]
mod windows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeProvider {
    #[cfg(windows)]
    Windows,
    #[cfg(unix)]
    Posix,
    /// No native support; metadata comes from the standard library only.
    Unavailable,
}

static PROVIDER: OnceLock<NativeProvider> = OnceLock::new();

/// The process-wide provider, selected on first use.
pub fn provider() -> &'static NativeProvider {
    PROVIDER.get_or_init(|| NativeProvider::detect(config::active().use_natives))
}

impl NativeProvider {
    /// Pick the provider for this host. `use_natives = false` forces the fallback.
    pub fn detect(use_natives: bool) -> Self {
        if !use_natives {
            info!("Native file attribute support disabled by configuration; using portable fallback");
            return NativeProvider::Unavailable;
        }
        #[cfg(windows)]
        let detected = NativeProvider::Windows;
        #[cfg(unix)]
        let detected = NativeProvider::Posix;
        #[cfg(not(any(unix, windows)))]
        let detected = {
            info!("No native file attribute provider for this platform; using portable fallback");
            NativeProvider::Unavailable
        };
        debug!(provider = detected.name(), "Selected file attribute provider");
        detected
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(windows)]
            NativeProvider::Windows => "windows",
            #[cfg(unix)]
            NativeProvider::Posix => "posix",
            NativeProvider::Unavailable => "portable",
        }
    }

    pub fn is_native(&self) -> bool {
        !matches!(self, NativeProvider::Unavailable)
    }

    /// The capability set the provider reports itself, if it can.
    pub fn reported_attributes(&self) -> Option<Attributes> {
        match self {
            #[cfg(windows)]
            NativeProvider::Windows => Some(win32::SUPPORTED),
            #[cfg(unix)]
            NativeProvider::Posix => None,
            NativeProvider::Unavailable => Some(Attributes::READ_ONLY),
        }
    }

    /// Negotiated capability set for this provider; the process provider
    /// answers from the cached set.
    pub fn supported_attributes(&self) -> Attributes {
        if PROVIDER.get() == Some(self) {
            capabilities::capabilities()
        } else {
            capabilities::negotiate(self)
        }
    }

    /// Snapshot of `path`. Never fails: problems are reported through
    /// `FileInfo::error` and absence through `exists == false`.
    pub fn fetch_file_info(&self, path: &Path) -> FileInfo {
        match self {
            #[cfg(windows)]
            NativeProvider::Windows => windows::fetch_file_info(path),
            #[cfg(unix)]
            NativeProvider::Posix => posix::fetch_file_info(path),
            NativeProvider::Unavailable => portable::fetch_file_info(path),
        }
    }

    /// Write the attribute bits of `info` to `path`. Bits outside the
    /// capability set are ignored. Returns false on failure.
    pub fn put_file_info(&self, path: &Path, info: &FileInfo, options: Options) -> bool {
        if !options.contains(Options::SET_ATTRIBUTES) {
            return true;
        }
        let caps = self.supported_attributes();
        match self {
            #[cfg(windows)]
            NativeProvider::Windows => windows::put_attributes(path, info.attributes, caps),
            #[cfg(unix)]
            NativeProvider::Posix => posix::put_attributes(path, info.attributes, caps),
            NativeProvider::Unavailable => portable::put_attributes(path, info.attributes, caps),
        }
    }
}

/// Final path segment as text, or empty for roots.
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Set or clear the read-only state of `path`.
///
/// On Unix "read-only" means the owner write bit is clear: setting it drops
/// every write bit, clearing it restores only the owner's.
pub(crate) fn set_read_only(path: &Path, read_only: bool) -> io::Result<()> {
    let meta = fs::metadata(path)?;
    let mut perms = meta.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = perms.mode();
        let updated = if read_only { mode & !0o222 } else { mode | 0o200 };
        if updated == mode {
            return Ok(());
        }
        perms.set_mode(updated);
    }
    #[cfg(not(unix))]
    {
        if perms.readonly() == read_only {
            return Ok(());
        }
        perms.set_readonly(read_only);
    }
    fs::set_permissions(path, perms)
}

/// Make `path` writable again so it can be removed or modified.
pub(crate) fn clear_read_only(path: &Path) -> io::Result<()> {
    set_read_only(path, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn disabled_natives_select_fallback() {
        let p = NativeProvider::detect(false);
        assert_eq!(p, NativeProvider::Unavailable);
        assert!(!p.is_native());
        assert_eq!(p.supported_attributes(), Attributes::READ_ONLY);
    }

    #[test]
    fn enabled_natives_select_os_provider() {
        let p = NativeProvider::detect(true);
        #[cfg(unix)]
        assert_eq!(p, NativeProvider::Posix);
        #[cfg(windows)]
        assert_eq!(p, NativeProvider::Windows);
    }

    #[test]
    fn missing_path_fetches_as_absent() {
        let td = tempdir().unwrap();
        let missing = td.path().join("nope");
        for p in [NativeProvider::detect(true), NativeProvider::Unavailable] {
            let info = p.fetch_file_info(&missing);
            assert!(!info.exists, "{}", p.name());
            assert!(info.error.is_none(), "{}", p.name());
            assert_eq!(info.name, "nope");
        }
    }

    #[test]
    fn read_only_round_trip_through_every_provider() {
        let td = tempdir().unwrap();
        let f = td.path().join("f.txt");
        fs::write(&f, b"x").unwrap();
        for p in [NativeProvider::detect(true), NativeProvider::Unavailable] {
            let mut info = p.fetch_file_info(&f);
            assert!(info.exists);
            assert!(!info.attribute(Attributes::READ_ONLY));

            info.set_attribute(Attributes::READ_ONLY, true);
            assert!(p.put_file_info(&f, &info, Options::SET_ATTRIBUTES));
            assert!(p.fetch_file_info(&f).attribute(Attributes::READ_ONLY), "{}", p.name());

            info.set_attribute(Attributes::READ_ONLY, false);
            assert!(p.put_file_info(&f, &info, Options::SET_ATTRIBUTES));
            assert!(!p.fetch_file_info(&f).attribute(Attributes::READ_ONLY), "{}", p.name());
        }
    }

    #[test]
    fn put_without_set_attributes_is_a_no_op() {
        let td = tempdir().unwrap();
        let f = td.path().join("f");
        fs::write(&f, b"x").unwrap();
        let mut info = FileInfo::new("f");
        info.set_attribute(Attributes::READ_ONLY, true);
        assert!(NativeProvider::Unavailable.put_file_info(&f, &info, Options::NONE));
        assert!(!fs::metadata(&f).unwrap().permissions().readonly());
    }

    #[test]
    fn process_provider_uses_cached_capabilities() {
        let p = provider();
        assert_eq!(p.supported_attributes(), capabilities::capabilities());
        assert_eq!(p.supported_attributes(), capabilities::negotiate(p));
    }

    #[test]
    fn base_name_of_root_is_empty() {
        assert_eq!(base_name(Path::new("/")), "");
        assert_eq!(base_name(Path::new("/a/b.txt")), "b.txt");
    }
}
