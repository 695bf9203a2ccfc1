//! Byte copying for the transfer engine.
//!
//! - `copy_bulk` hands the whole file to the OS primitive (`copy_file_range`,
//!   `fcopyfile`, `CopyFileExW` via `std::fs::copy`).
//! - `copy_streaming` pumps an already opened pair through fixed buffers and
//!   reports which side failed, so callers can tell a read error from a
//!   write error.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Buffer size for the streaming copy.
pub const BUF_SIZE: usize = 64 * 1024;

/// Which side of a streaming copy failed.
#[derive(Debug)]
pub enum StreamError {
    Read(io::Error),
    Write(io::Error),
}

/// Whole-file copy through the OS. Returns the number of bytes copied.
pub fn copy_bulk(src: &Path, dst: &Path) -> io::Result<u64> {
    fs::copy(src, dst)
}

/// Copy `src` into `dst` until EOF, then flush. Returns the number of bytes copied.
pub fn copy_streaming(src: File, dst: File) -> Result<u64, StreamError> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, src);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst);
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(StreamError::Write)?;
        total += n as u64;
    }
    writer.flush().map_err(StreamError::Write)?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copy_zero_length_ok() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("empty");
        let dst = dir.path().join("out");
        File::create(&src).unwrap();

        let n = copy_streaming(File::open(&src).unwrap(), File::create(&dst).unwrap()).unwrap();
        assert_eq!(n, 0);
        assert_eq!(fs::metadata(&dst).unwrap().len(), 0);
    }

    #[test]
    fn streaming_crosses_buffer_boundaries() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("big.bin");
        let dst = dir.path().join("big.out");
        let size = 2 * BUF_SIZE + 123;
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        fs::write(&src, &data).unwrap();

        let n = copy_streaming(File::open(&src).unwrap(), File::create(&dst).unwrap()).unwrap();
        assert_eq!(n as usize, size);
        assert_eq!(fs::read(&dst).unwrap(), data);
    }

    #[test]
    fn write_side_failure_is_reported_as_write() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("s");
        fs::write(&src, b"abc").unwrap();
        let ro = dir.path().join("ro");
        fs::write(&ro, b"").unwrap();
        // Opened read-only, so writing fails.
        let err = copy_streaming(File::open(&src).unwrap(), File::open(&ro).unwrap()).unwrap_err();
        assert!(matches!(err, StreamError::Write(_)));
    }

    #[test]
    fn bulk_copy_matches_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::write(&src, b"bulk data").unwrap();
        assert_eq!(copy_bulk(&src, &dst).unwrap(), 9);
        assert_eq!(fs::read(&dst).unwrap(), b"bulk data");
    }
}
