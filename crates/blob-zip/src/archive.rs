//! Zip-archive-backed [`BlobStore`] implementation.

use crate::container::ArchiveContainer;
use crate::section::{Content, Element, EntryDescriptor, ParsedEntry, Section, parse_entry_name};
use crate::writer::EntryWriter;
use blob_core::{
    AccessMode, ArchiveConfig, BlobStore, BlobStream, Compression, Elements, Key, KeyPath,
    ModeStream, NullStore, Result, StoreError,
};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Container of an open archive.
enum Backing<C> {
    /// A parsed zip archive.
    Archive(ZipArchive<C>),
    /// A zero-length container opened read-only; nothing has been written.
    Blank(C),
}

impl<C: Read + Seek> Backing<C> {
    fn archive(&mut self) -> Option<&mut ZipArchive<C>> {
        match self {
            Self::Archive(reader) => Some(reader),
            Self::Blank(_) => None,
        }
    }

    fn into_inner(self) -> C {
        match self {
            Self::Archive(reader) => reader.into_inner(),
            Self::Blank(container) => container,
        }
    }
}

/// Mutable state of an open archive.
pub(crate) struct ArchiveState<C> {
    /// `None` once the archive has been closed.
    reader: Option<Backing<C>>,
    /// Container handed back by [`ArchiveStore::into_inner`] after close.
    released: Option<C>,
    root: Section,
    dirty: bool,
}

impl<C> fmt::Debug for ArchiveState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveState")
            .field("open", &self.reader.is_some())
            .field("root", &self.root)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

/// State shared by the archive root and every section store borrowed from it.
#[derive(Debug)]
pub(crate) struct ArchiveShared<C> {
    state: RefCell<ArchiveState<C>>,
    config: ArchiveConfig,
    label: String,
}

/// A [`BlobStore`] over a zip archive held in a seekable container.
///
/// The entry list is read once at open and turned into a folder tree.
/// Reads come straight from the archive; writes, erases and new folders are
/// staged in memory and the container is rewritten once when the store is
/// closed (explicitly via [`close`](Self::close), or on drop).
///
/// Child stores borrow the archive, so the borrow checker guarantees every
/// section and stream is gone before the archive can be closed.
///
/// # Examples
///
/// ```
/// use blob_core::{BlobStore, Key};
/// use blob_zip::ArchiveStore;
/// use std::io::Cursor;
///
/// let archive = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
/// archive.write_element(&Key::new("hello.txt"), b"hi").unwrap();
/// let bytes = archive.into_inner().unwrap().into_inner();
///
/// let reopened = ArchiveStore::open_read_only(Cursor::new(bytes)).unwrap();
/// assert_eq!(reopened.read_element(&Key::new("hello.txt")).unwrap(), b"hi");
/// ```
#[derive(Debug)]
pub struct ArchiveStore<C: ArchiveContainer> {
    shared: ArchiveShared<C>,
    root: KeyPath,
    read_only: bool,
    descriptors: Vec<EntryDescriptor>,
}

/// A folder inside an [`ArchiveStore`].
pub struct SectionStore<'a, C: ArchiveContainer> {
    archive: &'a ArchiveShared<C>,
    path: KeyPath,
    read_only: bool,
}

impl<C: ArchiveContainer> fmt::Debug for SectionStore<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionStore")
            .field("archive", &self.archive.label)
            .field("path", &self.path)
            .field("read_only", &self.read_only)
            .finish()
    }
}

fn zip_error(label: &str, err: ZipError) -> StoreError {
    match err {
        ZipError::Io(e) => StoreError::Io(e),
        ZipError::FileNotFound => StoreError::NotFound {
            path: label.to_string(),
        },
        other => StoreError::Malformed {
            path: label.to_string(),
            reason: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

impl ArchiveStore<File> {
    /// Opens (or creates) the zip file at `path` with default settings.
    ///
    /// A missing or zero-length file is initialized as an empty archive when
    /// opened writable. Read-only opens never create or modify the file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened and
    /// [`StoreError::Malformed`] if it is not a zip archive.
    pub fn open_path(path: impl AsRef<Path>, read_only: bool) -> Result<Self> {
        Self::open_path_with(path, ArchiveConfig::default(), read_only)
    }

    /// Opens (or creates) the zip file at `path` with explicit settings.
    ///
    /// # Errors
    ///
    /// See [`ArchiveStore::open_path`].
    pub fn open_path_with(
        path: impl AsRef<Path>,
        config: ArchiveConfig,
        read_only: bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(!read_only)
            .create(!read_only)
            .truncate(false)
            .open(path)?;
        Self::open_labeled(file, config, read_only, path.display().to_string())
    }
}

impl<C: ArchiveContainer> ArchiveStore<C> {
    /// Opens a writable archive over `container` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the container holds something
    /// other than a zip archive.
    pub fn open(container: C) -> Result<Self> {
        Self::open_with(container, ArchiveConfig::default(), false)
    }

    /// Opens a read-only archive over `container`.
    ///
    /// # Errors
    ///
    /// See [`ArchiveStore::open`].
    pub fn open_read_only(container: C) -> Result<Self> {
        Self::open_with(container, ArchiveConfig::default(), true)
    }

    /// Opens an archive over `container` with explicit settings.
    ///
    /// # Errors
    ///
    /// See [`ArchiveStore::open`].
    pub fn open_with(container: C, config: ArchiveConfig, read_only: bool) -> Result<Self> {
        Self::open_labeled(container, config, read_only, "archive".to_string())
    }

    fn open_labeled(
        mut container: C,
        config: ArchiveConfig,
        read_only: bool,
        label: String,
    ) -> Result<Self> {
        let blank = container.seek(SeekFrom::End(0))? == 0;
        if blank && !read_only {
            ZipWriter::new(&mut container)
                .finish()
                .map_err(|e| zip_error(&label, e))?;
            debug!("Initialized empty archive {}", label);
        }
        container.rewind()?;

        let reader = if blank && read_only {
            debug!("Opened zero-length archive {} read-only", label);
            Backing::Blank(container)
        } else {
            Backing::Archive(ZipArchive::new(container).map_err(|e| zip_error(&label, e))?)
        };

        let mut descriptors = Vec::new();
        let mut folders = Vec::new();
        if let Backing::Archive(archive) = &reader {
            for name in archive.file_names() {
                match parse_entry_name(name)? {
                    ParsedEntry::Element(descriptor) => descriptors.push(descriptor),
                    ParsedEntry::Folder(path) => folders.push(path),
                }
            }
        }
        let root = Section::build(&descriptors, &folders);

        info!(
            "Opened archive {} ({} elements, read_only: {})",
            label,
            descriptors.len(),
            read_only
        );

        Ok(Self {
            shared: ArchiveShared {
                state: RefCell::new(ArchiveState {
                    reader: Some(reader),
                    released: None,
                    root,
                    dirty: false,
                }),
                config,
                label,
            },
            root: KeyPath::root(),
            read_only,
            descriptors,
        })
    }

    /// Entry descriptors read when the archive was opened.
    #[must_use]
    pub fn descriptors(&self) -> &[EntryDescriptor] {
        &self.descriptors
    }

    /// Number of elements in the whole tree, including staged ones.
    ///
    /// Returns 0 once the archive is closed.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        let state = self.shared.state.borrow();
        if state.reader.is_none() {
            return 0;
        }
        state.root.element_count()
    }

    /// Returns `true` if there are staged changes not yet written back.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.shared.state.borrow().dirty
    }

    /// Returns `true` once the archive has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.borrow().reader.is_none()
    }

    /// Writes staged changes back to the container and releases it.
    ///
    /// Every operation on the store afterwards fails with
    /// [`StoreError::Disposed`]. If the new archive image cannot be built,
    /// the store stays open with its changes staged and `close` can be
    /// retried. A failure while writing the image into the container leaves
    /// the store closed and the container contents undefined.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Disposed`] if already closed, and I/O or
    /// malformed-archive errors from the rewrite.
    pub fn close(&mut self) -> Result<()> {
        let state = self.shared.state.get_mut();
        let Some(mut reader) = state.reader.take() else {
            return Err(StoreError::disposed(&self.root));
        };

        if !state.dirty {
            state.released = Some(reader.into_inner());
            debug!("Closed archive {}", self.shared.label);
            return Ok(());
        }

        let bytes = match rewrite(reader.archive(), &state.root, &self.shared.config) {
            Ok(bytes) => bytes,
            Err(e) => {
                state.reader = Some(reader);
                let err = zip_error(&self.shared.label, e);
                warn!(
                    "Failed to rebuild archive {}, changes kept staged: {}",
                    self.shared.label, err
                );
                return Err(err);
            }
        };

        let mut container = reader.into_inner();
        let result = replace_contents(&mut container, &bytes).map_err(StoreError::from);
        state.released = Some(container);
        state.dirty = false;

        match &result {
            Ok(()) => debug!("Closed archive {}", self.shared.label),
            Err(e) => warn!("Failed to write back archive {}: {}", self.shared.label, e),
        }
        result
    }

    /// Closes the archive (if still open) and returns the container.
    ///
    /// # Errors
    ///
    /// Returns errors from [`close`](Self::close), except that an archive
    /// closed earlier is not an error.
    pub fn into_inner(mut self) -> Result<C> {
        if !self.is_closed() {
            self.close()?;
        }
        self.shared
            .state
            .get_mut()
            .released
            .take()
            .ok_or_else(|| StoreError::disposed(&self.root))
    }

    fn section(&self) -> SectionStore<'_, C> {
        SectionStore {
            archive: &self.shared,
            path: self.root.clone(),
            read_only: self.read_only,
        }
    }
}

impl<C: ArchiveContainer> Drop for ArchiveStore<C> {
    fn drop(&mut self) {
        if !self.is_closed()
            && let Err(e) = self.close()
        {
            warn!("Archive {} dropped with errors: {}", self.shared.label, e);
        }
    }
}

/// Writes the whole tree into a fresh archive image.
fn rewrite<C: ArchiveContainer>(
    reader: Option<&mut ZipArchive<C>>,
    root: &Section,
    config: &ArchiveConfig,
) -> std::result::Result<Vec<u8>, ZipError> {
    let method = match config.compression {
        Compression::Stored => CompressionMethod::Stored,
        Compression::Deflated => CompressionMethod::Deflated,
    };
    let options = SimpleFileOptions::default().compression_method(method);
    let separator = config.separator.to_string();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    write_section(&mut writer, reader, root, options, &separator)?;
    let bytes = writer.finish()?.into_inner();
    info!(
        "Rewrote archive with {} elements ({} bytes)",
        root.element_count(),
        bytes.len()
    );
    Ok(bytes)
}

fn write_section<C: ArchiveContainer>(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    mut reader: Option<&mut ZipArchive<C>>,
    section: &Section,
    options: SimpleFileOptions,
    separator: &str,
) -> std::result::Result<(), ZipError> {
    for element in section.elements.values() {
        writer.start_file(element.entry_name.as_str(), options)?;
        match &element.content {
            Content::Staged(bytes) => writer.write_all(bytes)?,
            Content::Archived => {
                copy_entry(writer, reader.as_deref_mut(), &element.entry_name)?;
            }
        }
    }

    // Entries hidden by a case-insensitive duplicate are carried over as-is.
    for name in &section.shadowed {
        if section.elements.values().any(|e| &e.entry_name == name) {
            continue;
        }
        writer.start_file(name.as_str(), options)?;
        copy_entry(writer, reader.as_deref_mut(), name)?;
    }

    if section.elements.is_empty()
        && section.shadowed.is_empty()
        && section.children.is_empty()
        && !section.path.is_empty()
    {
        writer.add_directory(
            format!("{}{separator}", section.path.render(separator)),
            options,
        )?;
    }

    for child in section.children.values() {
        write_section(writer, reader.as_deref_mut(), child, options, separator)?;
    }
    Ok(())
}

fn copy_entry<C: ArchiveContainer>(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    reader: Option<&mut ZipArchive<C>>,
    name: &str,
) -> std::result::Result<(), ZipError> {
    let mut file = reader.ok_or(ZipError::FileNotFound)?.by_name(name)?;
    io::copy(&mut file, writer)?;
    Ok(())
}

fn replace_contents<C: ArchiveContainer>(container: &mut C, bytes: &[u8]) -> io::Result<()> {
    container.rewind()?;
    container.write_all(bytes)?;
    container.truncate(u64::try_from(bytes.len()).map_err(io::Error::other)?)?;
    container.flush()
}

impl<C: ArchiveContainer> ArchiveShared<C> {
    fn missing_section(path: &KeyPath) -> StoreError {
        StoreError::NotFound {
            path: path.to_string(),
        }
    }

    fn with_section<T>(&self, path: &KeyPath, f: impl FnOnce(&Section) -> T) -> Result<T> {
        let state = self.state.borrow();
        if state.reader.is_none() {
            return Err(StoreError::disposed(path));
        }
        state
            .root
            .descend(path.segments())
            .map(f)
            .ok_or_else(|| Self::missing_section(path))
    }

    fn with_section_mut<T>(
        &self,
        path: &KeyPath,
        f: impl FnOnce(&mut Section, &mut bool) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.reader.is_none() {
            return Err(StoreError::disposed(path));
        }
        let section = state
            .root
            .descend_mut(path.segments())
            .ok_or_else(|| Self::missing_section(path))?;
        f(section, &mut state.dirty)
    }

    /// Reads the current content of an element.
    fn load(&self, path: &KeyPath, key: &Key) -> Result<Vec<u8>> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(backing) = state.reader.as_mut() else {
            return Err(StoreError::disposed(path));
        };
        let element = state
            .root
            .descend(path.segments())
            .and_then(|section| section.elements.get(key))
            .ok_or_else(|| StoreError::not_found(path, key))?;

        match &element.content {
            Content::Staged(bytes) => Ok(bytes.clone()),
            Content::Archived => {
                let reader = backing
                    .archive()
                    .ok_or_else(|| StoreError::not_found(path, key))?;
                let mut file = reader
                    .by_name(&element.entry_name)
                    .map_err(|e| zip_error(&self.label, e))?;
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }

    /// Replaces the staged content of an element, creating it if needed.
    pub(crate) fn stage(&self, path: &KeyPath, key: &Key, data: Vec<u8>) -> Result<()> {
        let separator = self.config.separator.to_string();
        self.with_section_mut(path, |section, dirty| {
            let len = data.len();
            match section.elements.get_mut(key) {
                Some(element) => element.content = Content::Staged(data),
                None => {
                    let entry_name = path.concat(key).render(&separator);
                    section.elements.insert(
                        key.clone(),
                        Element {
                            entry_name,
                            content: Content::Staged(data),
                        },
                    );
                }
            }
            *dirty = true;
            debug!("Staged {} bytes for {}", len, path.concat(key));
            Ok(())
        })
    }

    fn exists(&self, path: &KeyPath, key: &Key) -> Result<bool> {
        self.with_section(path, |section| section.elements.contains_key(key))
    }

    fn erase(&self, path: &KeyPath, key: &Key, read_only: bool) -> Result<()> {
        if read_only {
            return Err(StoreError::unsupported("erase", path));
        }
        self.with_section_mut(path, |section, dirty| {
            section
                .elements
                .remove(key)
                .ok_or_else(|| StoreError::not_found(path, key))?;
            *dirty = true;
            debug!("Erased {} from archive {}", path.concat(key), self.label);
            Ok(())
        })
    }

    fn has_child(&self, path: &KeyPath, key: &Key) -> Result<bool> {
        self.with_section(path, |section| section.children.contains_key(key))
    }

    fn child_keys(&self, path: &KeyPath) -> Result<BTreeSet<Key>> {
        self.with_section(path, |section| section.children.keys().cloned().collect())
    }

    fn child(&self, path: &KeyPath, key: &Key, read_only: bool) -> Result<Box<dyn BlobStore + '_>> {
        if self.has_child(path, key)? {
            Ok(Box::new(SectionStore {
                archive: self,
                path: path.concat(key),
                read_only,
            }))
        } else {
            Ok(Box::new(NullStore::child_of(path, key)))
        }
    }

    fn create_child(
        &self,
        path: &KeyPath,
        key: &Key,
        read_only: bool,
    ) -> Result<Box<dyn BlobStore + '_>> {
        if read_only {
            return Err(StoreError::unsupported("create_child_store", path));
        }
        self.with_section_mut(path, |section, dirty| {
            if !section.children.contains_key(key) {
                section
                    .children
                    .insert(key.clone(), Section::empty(path.concat(key)));
                *dirty = true;
                debug!("Created section {} in archive {}", path.concat(key), self.label);
            }
            Ok(())
        })?;
        Ok(Box::new(SectionStore {
            archive: self,
            path: path.concat(key),
            read_only,
        }))
    }

    /// Returns a snapshot of the section's element keys; the tree cannot
    /// stay borrowed past this call.
    fn enumerate(&self, path: &KeyPath) -> Result<Elements<'_>> {
        let keys: Vec<Key> =
            self.with_section(path, |section| section.elements.keys().cloned().collect())?;
        Ok(Box::new(keys.into_iter()))
    }

    fn open_stream(
        &self,
        path: &KeyPath,
        key: &Key,
        mode: AccessMode,
        read_only: bool,
    ) -> Result<Box<dyn BlobStream + '_>> {
        let mode = mode.validate()?;

        if !mode.allows_write() {
            let data = self.load(path, key)?;
            return Ok(Box::new(ModeStream::new(Cursor::new(data), mode)));
        }

        if read_only {
            return Err(StoreError::unsupported("open_stream(write)", path));
        }
        let initial = if mode.truncates() {
            Vec::new()
        } else {
            match self.load(path, key) {
                Ok(bytes) => bytes,
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e),
            }
        };
        self.stage(path, key, initial.clone())?;

        let writer = EntryWriter::new(
            self,
            path.clone(),
            key.clone(),
            initial,
            mode.contains(AccessMode::APPEND),
        );
        Ok(Box::new(ModeStream::new(writer, mode)))
    }
}

impl<C: ArchiveContainer> BlobStore for SectionStore<'_, C> {
    fn identifier(&self) -> &KeyPath {
        &self.path
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn exists(&self, key: &Key) -> Result<bool> {
        self.archive.exists(&self.path, key)
    }

    fn erase(&self, key: &Key) -> Result<()> {
        self.archive.erase(&self.path, key, self.read_only)
    }

    fn has_child_store(&self, key: &Key) -> Result<bool> {
        self.archive.has_child(&self.path, key)
    }

    fn get_child_store_keys(&self) -> Result<BTreeSet<Key>> {
        self.archive.child_keys(&self.path)
    }

    fn get_child_store(&self, key: &Key, read_only: bool) -> Result<Box<dyn BlobStore + '_>> {
        self.archive
            .child(&self.path, key, self.read_only || read_only)
    }

    fn create_child_store(&self, key: &Key) -> Result<Box<dyn BlobStore + '_>> {
        self.archive.create_child(&self.path, key, self.read_only)
    }

    fn enumerate(&self) -> Result<Elements<'_>> {
        self.archive.enumerate(&self.path)
    }

    fn open_stream(&self, key: &Key, mode: AccessMode) -> Result<Box<dyn BlobStream + '_>> {
        self.archive
            .open_stream(&self.path, key, mode, self.read_only)
    }
}

impl<C: ArchiveContainer> BlobStore for ArchiveStore<C> {
    fn identifier(&self) -> &KeyPath {
        &self.root
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn exists(&self, key: &Key) -> Result<bool> {
        self.section().exists(key)
    }

    fn erase(&self, key: &Key) -> Result<()> {
        self.section().erase(key)
    }

    fn has_child_store(&self, key: &Key) -> Result<bool> {
        self.section().has_child_store(key)
    }

    fn get_child_store_keys(&self) -> Result<BTreeSet<Key>> {
        self.section().get_child_store_keys()
    }

    fn get_child_store(&self, key: &Key, read_only: bool) -> Result<Box<dyn BlobStore + '_>> {
        self.shared
            .child(&self.root, key, self.read_only || read_only)
    }

    fn create_child_store(&self, key: &Key) -> Result<Box<dyn BlobStore + '_>> {
        self.shared.create_child(&self.root, key, self.read_only)
    }

    fn enumerate(&self) -> Result<Elements<'_>> {
        self.shared.enumerate(&self.root)
    }

    fn open_stream(&self, key: &Key, mode: AccessMode) -> Result<Box<dyn BlobStream + '_>> {
        self.shared
            .open_stream(&self.root, key, mode, self.read_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn key(text: &str) -> Key {
        Key::new(text)
    }

    /// Builds an archive image with the given entries using the zip crate directly.
    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_open_empty_container_initializes_archive() {
        let store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        assert_eq!(store.entry_count(), 0);
        assert!(store.get_child_store_keys().unwrap().is_empty());
        assert!(!store.is_dirty());

        let bytes = store.into_inner().unwrap().into_inner();
        assert!(!bytes.is_empty());
        assert!(entry_names(bytes).is_empty());
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let err = ArchiveStore::open(Cursor::new(b"definitely not a zip".to_vec())).unwrap_err();
        assert_eq!(err.kind(), blob_core::ErrorKind::Malformed);
    }

    #[test]
    fn test_tree_navigation() {
        let bytes = build_zip(&[
            ("a/b/c.txt", b"deep"),
            ("a/x.txt", b"shallow"),
            ("top.txt", b"top"),
            ("empty/", b""),
        ]);
        let store = ArchiveStore::open_read_only(Cursor::new(bytes)).unwrap();

        assert_eq!(store.descriptors().len(), 3);
        assert_eq!(store.entry_count(), 3);
        assert!(store.exists(&key("top.txt")).unwrap());
        assert!(!store.exists(&key("a")).unwrap());
        assert!(store.has_child_store(&key("a")).unwrap());
        assert!(store.has_child_store(&key("empty")).unwrap());

        let a = store.get_child_store(&key("a"), false).unwrap();
        assert_eq!(a.identifier(), &KeyPath::parse("a").unwrap());
        assert!(a.is_read_only());
        assert_eq!(a.read_element(&key("x.txt")).unwrap(), b"shallow");

        let b = a.get_child_store(&key("B"), false).unwrap();
        assert_eq!(b.read_element(&key("C.TXT")).unwrap(), b"deep");
        assert_eq!(b.enumerate().unwrap().collect::<Vec<_>>(), vec![key("c.txt")]);
    }

    #[test]
    fn test_missing_child_is_null_store() {
        let store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        let missing = store.get_child_store(&key("nope"), false).unwrap();
        assert_eq!(missing.identifier(), &KeyPath::parse("nope").unwrap());
        assert!(!missing.exists(&key("x")).unwrap());
        assert!(missing.get_child_store_keys().unwrap().is_empty());
    }

    #[test]
    fn test_read_only_rejects_mutation() {
        let bytes = build_zip(&[("a.txt", b"1")]);
        let store = ArchiveStore::open_read_only(Cursor::new(bytes)).unwrap();

        assert!(store.erase(&key("a.txt")).unwrap_err().is_unsupported());
        assert!(store.write_element(&key("b.txt"), b"2").unwrap_err().is_unsupported());
        assert!(store.create_child_store(&key("dir")).unwrap_err().is_unsupported());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_child_inherits_read_only_request() {
        let bytes = build_zip(&[("dir/a.txt", b"1")]);
        let store = ArchiveStore::open(Cursor::new(bytes)).unwrap();
        let dir = store.get_child_store(&key("dir"), true).unwrap();
        assert!(dir.is_read_only());
        assert!(dir.erase(&key("a.txt")).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_erase_missing_is_not_found() {
        let store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        assert!(store.erase(&key("ghost")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        let err = store.read_element(&key("ghost")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_then_read_before_close() {
        let store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        store.write_element(&key("note.txt"), b"draft").unwrap();

        assert!(store.is_dirty());
        assert!(store.exists(&key("note.txt")).unwrap());
        assert_eq!(store.read_element(&key("note.txt")).unwrap(), b"draft");
    }

    #[test]
    fn test_writer_stages_on_drop() {
        let store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        {
            let mut stream = store.open_stream(&key("log.txt"), AccessMode::WRITE).unwrap();
            stream.write_all(b"unflushed").unwrap();
        }
        assert_eq!(store.read_element(&key("log.txt")).unwrap(), b"unflushed");
    }

    #[test]
    fn test_append_mode() {
        let bytes = build_zip(&[("log.txt", b"one,")]);
        let store = ArchiveStore::open(Cursor::new(bytes)).unwrap();
        {
            let mut stream = store
                .open_stream(&key("log.txt"), AccessMode::APPEND)
                .unwrap();
            stream.seek(SeekFrom::Start(0)).unwrap();
            stream.write_all(b"two").unwrap();
            stream.flush().unwrap();
        }
        assert_eq!(store.read_element(&key("log.txt")).unwrap(), b"one,two");
    }

    #[test]
    fn test_read_write_mode_keeps_content() {
        let bytes = build_zip(&[("data.bin", b"abcdef")]);
        let store = ArchiveStore::open(Cursor::new(bytes)).unwrap();
        {
            let mut stream = store
                .open_stream(&key("data.bin"), AccessMode::READ | AccessMode::WRITE)
                .unwrap();
            let mut head = [0u8; 3];
            stream.read_exact(&mut head).unwrap();
            assert_eq!(&head, b"abc");
            stream.write_all(b"XYZ").unwrap();
        }
        assert_eq!(store.read_element(&key("data.bin")).unwrap(), b"abcXYZ");
    }

    #[test]
    fn test_write_only_stream_rejects_reads() {
        let store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        let mut stream = store.open_stream(&key("w.txt"), AccessMode::WRITE).unwrap();
        let mut buf = Vec::new();
        let err = stream.read_to_end(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn test_empty_mode_is_contract_violation() {
        let store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        let err = store
            .open_stream(&key("x"), AccessMode::empty())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_close_rewrites_changes() {
        let bytes = build_zip(&[
            ("keep.txt", b"keep"),
            ("drop.txt", b"drop"),
            ("dir/old.txt", b"old"),
        ]);
        let mut store = ArchiveStore::open(Cursor::new(bytes)).unwrap();

        store.erase(&key("drop.txt")).unwrap();
        {
            let dir = store.get_child_store(&key("dir"), false).unwrap();
            dir.write_element(&key("new.txt"), b"new").unwrap();
            let fresh = store.create_child_store(&key("fresh")).unwrap();
            assert!(fresh.get_child_store_keys().unwrap().is_empty());
        }
        store.close().unwrap();
        assert!(store.is_closed());

        let bytes = store.into_inner().unwrap().into_inner();
        assert_eq!(
            entry_names(bytes.clone()),
            vec!["dir/new.txt", "dir/old.txt", "fresh/", "keep.txt"]
        );

        let reopened = ArchiveStore::open_read_only(Cursor::new(bytes)).unwrap();
        assert_eq!(reopened.read_element(&key("keep.txt")).unwrap(), b"keep");
        assert!(!reopened.exists(&key("drop.txt")).unwrap());
        assert!(reopened.has_child_store(&key("fresh")).unwrap());
        let dir = reopened.get_child_store(&key("dir"), true).unwrap();
        assert_eq!(dir.read_element(&key("new.txt")).unwrap(), b"new");
        assert_eq!(dir.read_element(&key("old.txt")).unwrap(), b"old");
    }

    #[test]
    fn test_new_entries_use_configured_separator() {
        let config = ArchiveConfig {
            compression: Compression::Stored,
            separator: '\\',
        };
        let bytes = build_zip(&[("dir/", b"")]);
        let store = ArchiveStore::open_with(Cursor::new(bytes), config, false).unwrap();
        store
            .get_child_store(&key("dir"), false)
            .unwrap()
            .write_element(&key("a.txt"), b"1")
            .unwrap();

        let bytes = store.into_inner().unwrap().into_inner();
        assert_eq!(entry_names(bytes.clone()).len(), 1);

        let reopened = ArchiveStore::open_read_only(Cursor::new(bytes)).unwrap();
        let dir = reopened.get_child_store(&key("dir"), true).unwrap();
        assert_eq!(dir.read_element(&key("a.txt")).unwrap(), b"1");
    }

    #[test]
    fn test_operations_after_close_are_disposed() {
        let mut store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
        store.close().unwrap();

        let err = store.exists(&key("x")).unwrap_err();
        assert_eq!(err.kind(), blob_core::ErrorKind::Disposed);
        assert!(err.is_fatal());
        assert_eq!(
            store.get_child_store_keys().unwrap_err().kind(),
            blob_core::ErrorKind::Disposed
        );
        assert_eq!(
            store.read_element(&key("x")).unwrap_err().kind(),
            blob_core::ErrorKind::Disposed
        );
        assert_eq!(store.close().unwrap_err().kind(), blob_core::ErrorKind::Disposed);
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_unchanged_archive_is_not_rewritten() {
        let bytes = build_zip(&[("a.txt", b"1")]);
        let store = ArchiveStore::open(Cursor::new(bytes.clone())).unwrap();
        assert!(store.exists(&key("a.txt")).unwrap());
        assert_eq!(store.into_inner().unwrap().into_inner(), bytes);
    }

    #[test]
    fn test_read_only_blank_container_is_untouched() {
        let store = ArchiveStore::open_read_only(Cursor::new(Vec::new())).unwrap();
        assert_eq!(store.entry_count(), 0);
        assert!(store.get_child_store_keys().unwrap().is_empty());
        assert_eq!(store.enumerate().unwrap().count(), 0);
        assert!(store.read_element(&key("x")).unwrap_err().is_not_found());
        assert!(store.into_inner().unwrap().into_inner().is_empty());
    }

    #[test]
    fn test_read_only_open_of_empty_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("empty.zip");
        std::fs::write(&path, b"").unwrap();

        let mut store = ArchiveStore::open_path(&path, true).unwrap();
        assert!(store.get_child_store_keys().unwrap().is_empty());
        store.close().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_case_variant_entries_survive_rewrite() {
        let bytes = build_zip(&[("Readme.txt", b"upper"), ("readme.txt", b"lower")]);
        let store = ArchiveStore::open(Cursor::new(bytes)).unwrap();
        assert_eq!(store.entry_count(), 1);
        store.write_element(&key("other.txt"), b"other").unwrap();

        let bytes = store.into_inner().unwrap().into_inner();
        assert_eq!(
            entry_names(bytes.clone()),
            vec!["Readme.txt", "other.txt", "readme.txt"]
        );

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut upper = String::new();
        archive
            .by_name("Readme.txt")
            .unwrap()
            .read_to_string(&mut upper)
            .unwrap();
        assert_eq!(upper, "upper");
    }

    #[derive(Debug)]
    struct FlakyContainer {
        inner: Cursor<Vec<u8>>,
        fail_reads: Rc<Cell<bool>>,
    }

    impl Read for FlakyContainer {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_reads.get() {
                return Err(io::Error::other("read failed"));
            }
            self.inner.read(buf)
        }
    }

    impl Write for FlakyContainer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl Seek for FlakyContainer {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl ArchiveContainer for FlakyContainer {
        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.inner.truncate(len)
        }
    }

    #[test]
    fn test_failed_rewrite_keeps_store_open() {
        let fail_reads = Rc::new(Cell::new(false));
        let container = FlakyContainer {
            inner: Cursor::new(build_zip(&[("keep.txt", b"keep")])),
            fail_reads: Rc::clone(&fail_reads),
        };
        let mut store = ArchiveStore::open(container).unwrap();
        store.write_element(&key("new.txt"), b"new").unwrap();

        fail_reads.set(true);
        assert!(store.close().is_err());
        assert!(!store.is_closed());
        assert!(store.is_dirty());
        assert_eq!(store.read_element(&key("new.txt")).unwrap(), b"new");

        fail_reads.set(false);
        store.close().unwrap();
        let bytes = store.into_inner().unwrap().inner.into_inner();
        assert_eq!(entry_names(bytes), vec!["keep.txt", "new.txt"]);
    }

    #[test]
    fn test_file_backed_archive() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bundle.zip");
        {
            let store = ArchiveStore::open_path(&path, false).unwrap();
            store.write_element(&key("x"), b"payload").unwrap();
        }
        let store = ArchiveStore::open_path(&path, true).unwrap();
        assert!(store.exists(&key("x")).unwrap());
        assert_eq!(store.read_element(&key("x")).unwrap(), b"payload");
    }
}
