//! Write streams over archive elements.

use crate::archive::ArchiveShared;
use crate::container::ArchiveContainer;
use blob_core::{Key, KeyPath};
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use tracing::warn;

/// Buffers the content of one element and stages it into the section tree.
///
/// Content is staged on [`flush`](Write::flush) and again when the writer is
/// dropped with unflushed changes. The archive itself is only rewritten when
/// the owning [`ArchiveStore`](crate::ArchiveStore) is closed.
pub(crate) struct EntryWriter<'a, C: ArchiveContainer> {
    archive: &'a ArchiveShared<C>,
    section: KeyPath,
    key: Key,
    buffer: Cursor<Vec<u8>>,
    append: bool,
    pending: bool,
}

impl<'a, C: ArchiveContainer> EntryWriter<'a, C> {
    pub(crate) fn new(
        archive: &'a ArchiveShared<C>,
        section: KeyPath,
        key: Key,
        initial: Vec<u8>,
        append: bool,
    ) -> Self {
        let mut buffer = Cursor::new(initial);
        if append {
            buffer.set_position(buffer.get_ref().len() as u64);
        }
        Self {
            archive,
            section,
            key,
            buffer,
            append,
            pending: false,
        }
    }

    fn commit(&mut self) -> io::Result<()> {
        if !self.pending {
            return Ok(());
        }
        self.archive
            .stage(&self.section, &self.key, self.buffer.get_ref().clone())
            .map_err(io::Error::other)?;
        self.pending = false;
        Ok(())
    }
}

impl<C: ArchiveContainer> fmt::Debug for EntryWriter<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryWriter")
            .field("section", &self.section)
            .field("key", &self.key)
            .field("len", &self.buffer.get_ref().len())
            .field("append", &self.append)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl<C: ArchiveContainer> Read for EntryWriter<'_, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer.read(buf)
    }
}

impl<C: ArchiveContainer> Write for EntryWriter<'_, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.append {
            self.buffer.seek(SeekFrom::End(0))?;
        }
        let written = self.buffer.write(buf)?;
        self.pending = true;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }
}

impl<C: ArchiveContainer> Seek for EntryWriter<'_, C> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }
}

impl<C: ArchiveContainer> Drop for EntryWriter<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.commit() {
            warn!(
                "Failed to stage {} in section '{}': {}",
                self.key, self.section, e
            );
        }
    }
}
