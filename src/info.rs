//! Attribute model: the `FileInfo` snapshot, the attribute bit-set and the
//! option masks accepted by store operations.

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::ErrorKind;

/// Last-modified value reported when the time is unknown or the file is absent.
pub const LAST_MODIFIED_UNKNOWN: i64 = 0;

/// Bit-set of file attributes. Also used as the capability set of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attributes(u32);

impl Attributes {
    pub const NONE: Attributes = Attributes(0);
    pub const READ_ONLY: Attributes = Attributes(1 << 1);
    pub const HIDDEN: Attributes = Attributes(1 << 2);
    pub const ARCHIVE: Attributes = Attributes(1 << 3);
    pub const EXECUTABLE: Attributes = Attributes(1 << 4);
    pub const SYMLINK: Attributes = Attributes(1 << 5);
    /// Capability-only bit: the provider can resolve link targets.
    pub const LINK_TARGET: Attributes = Attributes(1 << 6);

    const NAMED: [(Attributes, &'static str); 6] = [
        (Attributes::READ_ONLY, "read_only"),
        (Attributes::HIDDEN, "hidden"),
        (Attributes::ARCHIVE, "archive"),
        (Attributes::EXECUTABLE, "executable"),
        (Attributes::SYMLINK, "symlink"),
        (Attributes::LINK_TARGET, "link_target"),
    ];

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Attributes) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Attributes) -> Attributes {
        Attributes(self.0 | other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn set(&mut self, other: Attributes, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }

    /// Names of the bits that are set, in declaration order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Every bit that can be negotiated with a provider.
    pub fn all() -> Attributes {
        Self::NAMED.iter().fold(Attributes::NONE, |acc, (bit, _)| acc | *bit)
    }
}

impl BitOr for Attributes {
    type Output = Attributes;
    fn bitor(self, rhs: Attributes) -> Attributes {
        Attributes(self.0 | rhs.0)
    }
}

impl BitOrAssign for Attributes {
    fn bitor_assign(&mut self, rhs: Attributes) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Attributes {
    type Output = Attributes;
    fn bitand(self, rhs: Attributes) -> Attributes {
        Attributes(self.0 & rhs.0)
    }
}

impl Not for Attributes {
    type Output = Attributes;
    fn not(self) -> Attributes {
        Attributes(!self.0)
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

/// Option mask accepted by mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options(u32);

impl Options {
    pub const NONE: Options = Options(0);
    /// Append instead of truncating when writing.
    pub const APPEND: Options = Options(1 << 0);
    /// Replace an existing destination on copy/move.
    pub const OVERWRITE: Options = Options(1 << 1);
    /// Create only the last segment in `mkdir`.
    pub const SHALLOW: Options = Options(1 << 2);
    pub const SET_ATTRIBUTES: Options = Options(1 << 10);
    pub const SET_LAST_MODIFIED: Options = Options(1 << 11);

    #[inline]
    pub const fn contains(self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Options {
    type Output = Options;
    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

/// Snapshot of one path's metadata at the time it was fetched.
///
/// When `exists` is false every other field except `name` and `error` is
/// meaningless and must not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub exists: bool,
    pub is_directory: bool,
    /// Length in bytes; zero when unknown or for directories on most platforms.
    pub length: u64,
    /// Milliseconds since the Unix epoch, or `LAST_MODIFIED_UNKNOWN`.
    pub last_modified: i64,
    pub attributes: Attributes,
    /// Only set when `SYMLINK` is present and the provider resolves targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
    /// Set when the fetch itself failed, as opposed to the path being absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl FileInfo {
    /// An info describing a path that does not exist.
    pub fn new(name: impl Into<String>) -> Self {
        FileInfo {
            name: name.into(),
            exists: false,
            is_directory: false,
            length: 0,
            last_modified: LAST_MODIFIED_UNKNOWN,
            attributes: Attributes::NONE,
            link_target: None,
            error: None,
        }
    }

    #[inline]
    pub fn attribute(&self, attr: Attributes) -> bool {
        self.attributes.contains(attr)
    }

    #[inline]
    pub fn set_attribute(&mut self, attr: Attributes, on: bool) {
        self.attributes.set(attr, on);
    }
}

/// Convert a `SystemTime` to epoch milliseconds (negative before 1970).
pub(crate) fn system_time_to_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_bits() {
        let mut a = Attributes::NONE;
        a.set(Attributes::READ_ONLY, true);
        a.set(Attributes::HIDDEN, true);
        assert!(a.contains(Attributes::READ_ONLY | Attributes::HIDDEN));
        a.set(Attributes::READ_ONLY, false);
        assert!(!a.contains(Attributes::READ_ONLY));
        assert_eq!(a.to_string(), "hidden");
        assert_eq!(Attributes::NONE.to_string(), "none");
    }

    #[test]
    fn all_covers_every_named_bit() {
        let all = Attributes::all();
        for bit in [
            Attributes::READ_ONLY,
            Attributes::HIDDEN,
            Attributes::ARCHIVE,
            Attributes::EXECUTABLE,
            Attributes::SYMLINK,
            Attributes::LINK_TARGET,
        ] {
            assert!(all.contains(bit));
        }
    }

    #[test]
    fn missing_info_defaults() {
        let info = FileInfo::new("x");
        assert!(!info.exists);
        assert_eq!(info.last_modified, LAST_MODIFIED_UNKNOWN);
        assert!(info.attributes.is_empty());
    }

    #[test]
    fn attributes_serialize_as_names() {
        let json = serde_json::to_string(&(Attributes::READ_ONLY | Attributes::SYMLINK)).unwrap();
        assert_eq!(json, r#"["read_only","symlink"]"#);
    }

    #[test]
    fn options_combine() {
        let o = Options::SET_ATTRIBUTES | Options::SET_LAST_MODIFIED;
        assert!(o.contains(Options::SET_ATTRIBUTES));
        assert!(!o.contains(Options::OVERWRITE));
        assert!(Options::NONE.contains(Options::NONE));
    }

    #[test]
    fn millis_conversion() {
        let t = UNIX_EPOCH + std::time::Duration::from_millis(1_500);
        assert_eq!(system_time_to_millis(t), 1_500);
        let before = UNIX_EPOCH - std::time::Duration::from_millis(2_000);
        assert_eq!(system_time_to_millis(before), -2_000);
    }
}
