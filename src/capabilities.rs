//! Attribute capability negotiation.
//!
//! The set of attribute bits the active provider can read and write is computed
//! once per process and never invalidated. Racing first calls are harmless: the
//! computation is a pure function of the host.

use std::sync::OnceLock;

use crate::info::Attributes;
use crate::native::{self, NativeProvider};

static CAPABILITIES: OnceLock<Attributes> = OnceLock::new();

/// Capability set of the process-wide provider.
pub fn capabilities() -> Attributes {
    *CAPABILITIES.get_or_init(|| negotiate(native::provider()))
}

/// Capability set for `provider`, falling back to the OS table when the
/// provider cannot report one itself.
pub fn negotiate(provider: &NativeProvider) -> Attributes {
    provider.reported_attributes().unwrap_or_else(static_table)
}

/// Per-OS table used when a provider does not report its own set.
pub fn static_table() -> Attributes {
    if cfg!(windows) {
        Attributes::SYMLINK
            | Attributes::LINK_TARGET
            | Attributes::ARCHIVE
            | Attributes::READ_ONLY
            | Attributes::HIDDEN
    } else {
        Attributes::EXECUTABLE | Attributes::SYMLINK | Attributes::LINK_TARGET | Attributes::READ_ONLY
    }
}

/// True when `attr` can be read and written on this host.
#[inline]
pub fn is_supported(attr: Attributes) -> bool {
    capabilities().contains(attr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_always_in_table() {
        assert!(static_table().contains(Attributes::READ_ONLY));
    }

    #[test]
    fn cached_value_is_stable() {
        let a = capabilities();
        let b = capabilities();
        assert_eq!(a, b);
        assert!(a.contains(Attributes::READ_ONLY));
    }

    #[test]
    fn unavailable_provider_reports_read_only_only() {
        assert_eq!(negotiate(&NativeProvider::Unavailable), Attributes::READ_ONLY);
    }

    #[cfg(unix)]
    #[test]
    fn posix_uses_static_table() {
        let caps = negotiate(&NativeProvider::Posix);
        assert!(caps.contains(Attributes::EXECUTABLE | Attributes::SYMLINK | Attributes::LINK_TARGET));
        assert!(!caps.contains(Attributes::HIDDEN));
        assert!(!caps.contains(Attributes::ARCHIVE));
    }
}
