//! Byte streams returned by [`BlobStore::open_stream`](crate::BlobStore::open_stream).

use crate::mode::AccessMode;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// A seekable byte stream over one element.
///
/// Implemented for every `Read + Write + Seek + Debug` type, so backends can
/// hand out `File`, `Cursor<Vec<u8>>` or their own writer types.
pub trait BlobStream: Read + Write + Seek + fmt::Debug {}

impl<T: Read + Write + Seek + fmt::Debug + ?Sized> BlobStream for T {}

/// Wraps a backend stream and enforces the mode it was opened with.
///
/// Reads on a stream opened without `READ`, and writes on a stream opened
/// without `WRITE` or `APPEND`, fail with [`io::ErrorKind::Unsupported`].
///
/// # Examples
///
/// ```
/// use blob_core::{AccessMode, ModeStream};
/// use std::io::{Cursor, Read, Write};
///
/// let mut stream = ModeStream::new(Cursor::new(b"abc".to_vec()), AccessMode::READ);
/// let mut text = String::new();
/// stream.read_to_string(&mut text).unwrap();
/// assert_eq!(text, "abc");
/// assert!(stream.write_all(b"x").is_err());
/// ```
#[derive(Debug)]
pub struct ModeStream<S> {
    inner: S,
    mode: AccessMode,
}

impl<S> ModeStream<S> {
    /// Wraps `inner`, allowing only what `mode` requests.
    pub const fn new(inner: S, mode: AccessMode) -> Self {
        Self { inner, mode }
    }

    /// Returns the mode the stream was opened with.
    pub const fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Unwraps the backend stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn denied(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("stream was not opened for {what}"),
    )
}

impl<S: Read> Read for ModeStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.mode.allows_read() {
            return Err(denied("reading"));
        }
        self.inner.read(buf)
    }
}

impl<S: Write> Write for ModeStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.mode.allows_write() {
            return Err(denied("writing"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Seek> Seek for ModeStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
