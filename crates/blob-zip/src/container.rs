//! Seekable byte containers an archive can live in.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, Write};

/// A seekable, writable container holding one zip archive.
///
/// Rewriting an archive in place can shrink it, so containers must support
/// truncation in addition to `Read + Write + Seek`.
pub trait ArchiveContainer: Read + Write + Seek + fmt::Debug {
    /// Shrinks or extends the container to exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the container cannot be resized.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl ArchiveContainer for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl ArchiveContainer for Cursor<Vec<u8>> {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(io::Error::other)?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_truncate() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4]);
        cursor.truncate(2).unwrap();
        assert_eq!(cursor.get_ref(), &vec![1, 2]);
    }

    #[test]
    fn test_file_truncate() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"abcdef").unwrap();
        file.truncate(3).unwrap();
        assert_eq!(file.metadata().unwrap().len(), 3);
    }
}
