//! Win32 directory-entry record layout and attribute arithmetic.
//!
//! Pure byte/bit manipulation only, so it builds and is tested on every
//! platform. The FFI side lives in `native::windows`.
//!
//! Layout of `WIN32_FIND_DATAW` (all fields little-endian, no padding):
//!
//! ```text
//!   DWORD    dwFileAttributes
//!   FILETIME ftCreationTime
//!   FILETIME ftLastAccessTime
//!   FILETIME ftLastWriteTime
//!   DWORD    nFileSizeHigh
//!   DWORD    nFileSizeLow
//!   DWORD    dwReserved0        reparse tag when FILE_ATTRIBUTE_REPARSE_POINT is set
//!   DWORD    dwReserved1
//!   WCHAR    cFileName[MAX_PATH]
//!   WCHAR    cAlternateFileName[14]
//! ```

use crate::info::Attributes;

pub const DWORD_SIZE: usize = 4;
pub const FILETIME_SIZE: usize = 2 * DWORD_SIZE;
pub const WCHAR_SIZE: usize = 2;
pub const MAX_PATH: usize = 260;
pub const ALTERNATE_NAME_CHARS: usize = 14;

pub const DW_FILE_ATTRIBUTES: usize = 0;
pub const FT_CREATION_TIME: usize = DW_FILE_ATTRIBUTES + DWORD_SIZE;
pub const FT_LAST_ACCESS_TIME: usize = FT_CREATION_TIME + FILETIME_SIZE;
pub const FT_LAST_WRITE_TIME: usize = FT_LAST_ACCESS_TIME + FILETIME_SIZE;
pub const N_FILE_SIZE_HIGH: usize = FT_LAST_WRITE_TIME + FILETIME_SIZE;
pub const N_FILE_SIZE_LOW: usize = N_FILE_SIZE_HIGH + DWORD_SIZE;
pub const DW_RESERVED_0: usize = N_FILE_SIZE_LOW + DWORD_SIZE;
pub const DW_RESERVED_1: usize = DW_RESERVED_0 + DWORD_SIZE;
pub const C_FILE_NAME: usize = DW_RESERVED_1 + DWORD_SIZE;
pub const C_ALTERNATE_FILE_NAME: usize = C_FILE_NAME + MAX_PATH * WCHAR_SIZE;
pub const RECORD_SIZE: usize = C_ALTERNATE_FILE_NAME + ALTERNATE_NAME_CHARS * WCHAR_SIZE;

pub const FILE_ATTRIBUTE_READONLY: u32 = 0x0000_0001;
pub const FILE_ATTRIBUTE_HIDDEN: u32 = 0x0000_0002;
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x0000_0010;
pub const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x0000_0020;
/// Only valid alone; means "no other attribute set".
pub const FILE_ATTRIBUTE_NORMAL: u32 = 0x0000_0080;
pub const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x0000_0400;
pub const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;

pub const RAW_PATH_PREFIX: &str = r"\\?\";
pub const UNC_RAW_PATH_PREFIX: &str = r"\\?\UNC";

/// 100ns intervals between 1601-01-01 and 1970-01-01, expressed in milliseconds.
const FILETIME_EPOCH_OFFSET_MILLIS: i64 = 11_644_473_600_000;

/// Attribute bits the Windows provider reads and writes.
pub const SUPPORTED: Attributes = Attributes::SYMLINK
    .union(Attributes::LINK_TARGET)
    .union(Attributes::ARCHIVE)
    .union(Attributes::READ_ONLY)
    .union(Attributes::HIDDEN);

/// Decoded directory-entry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindRecord {
    pub attributes: u32,
    pub creation_time: u64,
    pub last_access_time: u64,
    pub last_write_time: u64,
    pub size_high: u32,
    pub size_low: u32,
    pub reserved0: u32,
    pub reserved1: u32,
    pub file_name: String,
    pub alternate_name: String,
}

impl FindRecord {
    #[inline]
    pub fn has(&self, flag: u32) -> bool {
        self.attributes & flag != 0
    }

    /// `high * 2^32 + low`.
    #[inline]
    pub fn length(&self) -> u64 {
        (u64::from(self.size_high) << 32) + u64::from(self.size_low)
    }

    /// A reparse point whose tag says "symbolic link".
    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.has(FILE_ATTRIBUTE_REPARSE_POINT) && self.reserved0 == IO_REPARSE_TAG_SYMLINK
    }

    /// Last write time in epoch milliseconds.
    #[inline]
    pub fn last_modified_millis(&self) -> i64 {
        filetime_to_millis(self.last_write_time)
    }

    /// The attribute bits this record carries (link target is resolved separately).
    pub fn attribute_bits(&self) -> Attributes {
        let mut attrs = Attributes::NONE;
        attrs.set(Attributes::ARCHIVE, self.has(FILE_ATTRIBUTE_ARCHIVE));
        attrs.set(Attributes::READ_ONLY, self.has(FILE_ATTRIBUTE_READONLY));
        attrs.set(Attributes::HIDDEN, self.has(FILE_ATTRIBUTE_HIDDEN));
        attrs.set(Attributes::SYMLINK, self.is_symlink());
        attrs
    }
}

/// Decode a raw `WIN32_FIND_DATAW` buffer. Returns `None` when it is too short.
pub fn decode(bytes: &[u8]) -> Option<FindRecord> {
    if bytes.len() < RECORD_SIZE {
        return None;
    }
    Some(FindRecord {
        attributes: read_dword(bytes, DW_FILE_ATTRIBUTES),
        creation_time: read_filetime(bytes, FT_CREATION_TIME),
        last_access_time: read_filetime(bytes, FT_LAST_ACCESS_TIME),
        last_write_time: read_filetime(bytes, FT_LAST_WRITE_TIME),
        size_high: read_dword(bytes, N_FILE_SIZE_HIGH),
        size_low: read_dword(bytes, N_FILE_SIZE_LOW),
        reserved0: read_dword(bytes, DW_RESERVED_0),
        reserved1: read_dword(bytes, DW_RESERVED_1),
        file_name: read_wide(bytes, C_FILE_NAME, MAX_PATH),
        alternate_name: read_wide(bytes, C_ALTERNATE_FILE_NAME, ALTERNATE_NAME_CHARS),
    })
}

fn read_dword(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; DWORD_SIZE];
    raw.copy_from_slice(&bytes[offset..offset + DWORD_SIZE]);
    u32::from_le_bytes(raw)
}

fn read_filetime(bytes: &[u8], offset: usize) -> u64 {
    let low = read_dword(bytes, offset);
    let high = read_dword(bytes, offset + DWORD_SIZE);
    (u64::from(high) << 32) | u64::from(low)
}

/// NUL-terminated UTF-16 string from a fixed-width buffer of `chars` units.
fn read_wide(bytes: &[u8], offset: usize, chars: usize) -> String {
    let units: Vec<u16> = bytes[offset..offset + chars * WCHAR_SIZE]
        .chunks_exact(WCHAR_SIZE)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

pub fn filetime_to_millis(filetime: u64) -> i64 {
    (filetime / 10_000) as i64 - FILETIME_EPOCH_OFFSET_MILLIS
}

/// Apply the requested DOS bits to `current`, touching only bits in `caps`.
/// `FILE_ATTRIBUTE_NORMAL` is read as "nothing set" and never OR'd with other bits.
pub fn apply_attributes(current: u32, requested: Attributes, caps: Attributes) -> u32 {
    let mut updated = normalize(current);
    for (attr, flag) in [
        (Attributes::ARCHIVE, FILE_ATTRIBUTE_ARCHIVE),
        (Attributes::READ_ONLY, FILE_ATTRIBUTE_READONLY),
        (Attributes::HIDDEN, FILE_ATTRIBUTE_HIDDEN),
    ] {
        if !caps.contains(attr) {
            continue;
        }
        if requested.contains(attr) {
            updated |= flag;
        } else {
            updated &= !flag;
        }
    }
    updated
}

#[inline]
pub fn normalize(current: u32) -> u32 {
    if current == FILE_ATTRIBUTE_NORMAL { 0 } else { current }
}

/// Convert to the long (`\\?\`) form accepted by the wide-character API.
/// UNC paths `\\server\share` become `\\?\UNC\server\share`.
pub fn to_long_path(path: &str) -> String {
    if path.starts_with(r"\\") && !path.starts_with(RAW_PATH_PREFIX) {
        format!("{UNC_RAW_PATH_PREFIX}{}", &path[1..])
    } else if !path.starts_with(RAW_PATH_PREFIX) {
        format!("{RAW_PATH_PREFIX}{path}")
    } else {
        path.to_string()
    }
}

/// A bare drive root in long form, e.g. `\\?\C:\`. Directory enumeration does not
/// work at that level.
pub fn is_drive_root(long_path: &str) -> bool {
    long_path.len() == 7 && long_path.starts_with(RAW_PATH_PREFIX) && long_path.ends_with(r":\")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_dword(buf: &mut [u8], offset: usize, v: u32) {
        buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn put_wide(buf: &mut [u8], offset: usize, s: &str) {
        for (i, unit) in s.encode_utf16().enumerate() {
            buf[offset + i * 2..offset + i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
    }

    #[test]
    fn layout_matches_native_struct_size() {
        assert_eq!(C_FILE_NAME, 44);
        assert_eq!(C_ALTERNATE_FILE_NAME, 564);
        assert_eq!(RECORD_SIZE, 592);
    }

    #[test]
    fn decodes_known_record() {
        let mut buf = vec![0u8; RECORD_SIZE];
        put_dword(&mut buf, DW_FILE_ATTRIBUTES, FILE_ATTRIBUTE_ARCHIVE | FILE_ATTRIBUTE_REPARSE_POINT);
        // 2020-01-01T00:00:00Z
        let ft: u64 = (1_577_836_800_000u64 + 11_644_473_600_000) * 10_000;
        put_dword(&mut buf, FT_LAST_WRITE_TIME, ft as u32);
        put_dword(&mut buf, FT_LAST_WRITE_TIME + 4, (ft >> 32) as u32);
        put_dword(&mut buf, N_FILE_SIZE_HIGH, 1);
        put_dword(&mut buf, N_FILE_SIZE_LOW, 5);
        put_dword(&mut buf, DW_RESERVED_0, IO_REPARSE_TAG_SYMLINK);
        put_wide(&mut buf, C_FILE_NAME, "link.txt");
        put_wide(&mut buf, C_ALTERNATE_FILE_NAME, "LINK~1.TXT");

        let rec = decode(&buf).expect("full record decodes");
        assert_eq!(rec.file_name, "link.txt");
        assert_eq!(rec.alternate_name, "LINK~1.TXT");
        assert_eq!(rec.length(), (1u64 << 32) + 5);
        assert_eq!(rec.last_modified_millis(), 1_577_836_800_000);
        assert!(rec.is_symlink());
        assert!(!rec.has(FILE_ATTRIBUTE_DIRECTORY));
        let bits = rec.attribute_bits();
        assert!(bits.contains(Attributes::ARCHIVE | Attributes::SYMLINK));
        assert!(!bits.contains(Attributes::READ_ONLY));
    }

    #[test]
    fn reparse_point_without_symlink_tag_is_not_a_link() {
        let mut buf = vec![0u8; RECORD_SIZE];
        put_dword(&mut buf, DW_FILE_ATTRIBUTES, FILE_ATTRIBUTE_REPARSE_POINT | FILE_ATTRIBUTE_DIRECTORY);
        put_dword(&mut buf, DW_RESERVED_0, 0xA000_0003); // mount point
        let rec = decode(&buf).unwrap();
        assert!(!rec.is_symlink());
        assert!(rec.has(FILE_ATTRIBUTE_DIRECTORY));
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(decode(&[0u8; RECORD_SIZE - 1]).is_none());
    }

    #[test]
    fn normal_flag_is_not_combined() {
        let updated = apply_attributes(FILE_ATTRIBUTE_NORMAL, Attributes::READ_ONLY, SUPPORTED);
        assert_eq!(updated, FILE_ATTRIBUTE_READONLY);
    }

    #[test]
    fn bits_outside_caps_are_left_alone() {
        let current = FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_ARCHIVE;
        let updated = apply_attributes(current, Attributes::READ_ONLY, Attributes::READ_ONLY);
        assert_eq!(updated, current | FILE_ATTRIBUTE_READONLY);
        let cleared = apply_attributes(current, Attributes::NONE, SUPPORTED);
        assert_eq!(cleared, 0);
    }

    #[test]
    fn long_path_forms() {
        assert_eq!(to_long_path(r"C:\work\a.txt"), r"\\?\C:\work\a.txt");
        assert_eq!(to_long_path(r"\\server\share\a"), r"\\?\UNC\server\share\a");
        assert_eq!(to_long_path(r"\\?\C:\x"), r"\\?\C:\x");
        assert!(is_drive_root(r"\\?\c:\"));
        assert!(!is_drive_root(r"\\?\c:\dir"));
    }
}
