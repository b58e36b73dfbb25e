//! Disk-backed [`BlobStore`] implementation.

use blob_core::{
    AccessMode, BlobStore, BlobStream, Elements, Key, KeyPath, ModeStream, NullStore, Result,
    StoreError,
};
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Kind of directory entry a lookup is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    fn matches(self, file_type: fs::FileType) -> bool {
        match self {
            Self::File => file_type.is_file(),
            Self::Dir => file_type.is_dir(),
        }
    }
}

/// A store over one directory of the local filesystem.
///
/// The identifier is relative to the directory the store was opened on, so
/// the opened directory itself has the root path. Keys match directory
/// entries case-insensitively, consistent with [`Key`] equality.
///
/// # Thread Safety
///
/// `DirectoryStore` holds no open handles and is `Send + Sync`. Concurrent
/// writers to the same element are not coordinated.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
    path: KeyPath,
    read_only: bool,
}

impl DirectoryStore {
    /// Opens an existing directory as a store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `dir` does not exist or is not a
    /// directory.
    pub fn open(dir: impl AsRef<Path>, read_only: bool) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(StoreError::NotFound {
                path: dir.display().to_string(),
            });
        }
        debug!("Opened directory store at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            path: KeyPath::root(),
            read_only,
        })
    }

    /// Creates `dir` (and missing parents) and opens it writable.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            debug!("Created directory store at {}", dir.display());
        }
        Self::open(dir, false)
    }

    /// Returns the directory this store maps.
    #[must_use]
    pub fn os_path(&self) -> &Path {
        &self.dir
    }

    fn child(&self, dir: PathBuf, key: &Key, read_only: bool) -> Self {
        Self {
            dir,
            path: self.path.concat(key),
            read_only: self.read_only || read_only,
        }
    }

    fn direct_entries(&self) -> impl Iterator<Item = walkdir::Result<DirEntry>> + use<> {
        WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
    }

    /// Finds the on-disk entry named by `key`, ignoring case.
    fn resolve(&self, key: &Key, kind: EntryKind) -> Result<Option<PathBuf>> {
        let exact = self.dir.join(key.as_str());
        if let Ok(metadata) = fs::metadata(&exact)
            && kind.matches(metadata.file_type())
        {
            return Ok(Some(exact));
        }

        for entry in self.direct_entries() {
            let entry = entry.map_err(io::Error::from)?;
            if !kind.matches(entry.file_type()) {
                continue;
            }
            if entry.file_name().to_str().is_some_and(|name| key.matches(name)) {
                return Ok(Some(entry.into_path()));
            }
        }
        Ok(None)
    }

    fn entry_keys(&self, kind: EntryKind) -> impl Iterator<Item = Key> + use<> {
        self.direct_entries().filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable directory entry: {}", e);
                    return None;
                }
            };
            if !kind.matches(entry.file_type()) {
                return None;
            }
            let name = entry.file_name().to_str()?;
            Key::try_new(name).ok()
        })
    }

    fn ensure_writable(&self, operation: &'static str) -> Result<()> {
        if self.read_only {
            return Err(StoreError::unsupported(operation, &self.path));
        }
        Ok(())
    }
}

impl BlobStore for DirectoryStore {
    fn identifier(&self) -> &KeyPath {
        &self.path
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn exists(&self, key: &Key) -> Result<bool> {
        Ok(self.resolve(key, EntryKind::File)?.is_some())
    }

    fn erase(&self, key: &Key) -> Result<()> {
        self.ensure_writable("erase")?;
        let file = self
            .resolve(key, EntryKind::File)?
            .ok_or_else(|| StoreError::not_found(&self.path, key))?;
        fs::remove_file(&file)?;
        debug!("Erased {}", file.display());
        Ok(())
    }

    fn has_child_store(&self, key: &Key) -> Result<bool> {
        Ok(self.resolve(key, EntryKind::Dir)?.is_some())
    }

    fn get_child_store_keys(&self) -> Result<BTreeSet<Key>> {
        let mut keys = BTreeSet::new();
        for entry in self.direct_entries() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(key) = entry.file_name().to_str().and_then(|n| Key::try_new(n).ok()) {
                keys.insert(key);
            }
        }
        Ok(keys)
    }

    fn get_child_store(&self, key: &Key, read_only: bool) -> Result<Box<dyn BlobStore + '_>> {
        match self.resolve(key, EntryKind::Dir)? {
            Some(dir) => Ok(Box::new(self.child(dir, key, read_only))),
            None => Ok(Box::new(NullStore::child_of(&self.path, key))),
        }
    }

    fn create_child_store(&self, key: &Key) -> Result<Box<dyn BlobStore + '_>> {
        self.ensure_writable("create_child_store")?;
        let dir = match self.resolve(key, EntryKind::Dir)? {
            Some(dir) => dir,
            None => {
                let dir = self.dir.join(key.as_str());
                fs::create_dir(&dir)?;
                debug!("Created child store directory {}", dir.display());
                dir
            }
        };
        Ok(Box::new(self.child(dir, key, false)))
    }

    fn enumerate(&self) -> Result<Elements<'_>> {
        Ok(Box::new(self.entry_keys(EntryKind::File)))
    }

    fn open_stream(&self, key: &Key, mode: AccessMode) -> Result<Box<dyn BlobStream + '_>> {
        let mode = mode.validate()?;
        if mode.allows_write() {
            self.ensure_writable("open_stream(write)")?;
        }

        let file_path = match self.resolve(key, EntryKind::File)? {
            Some(path) => path,
            None if mode.allows_write() => self.dir.join(key.as_str()),
            None => return Err(StoreError::not_found(&self.path, key)),
        };

        let file = OpenOptions::new()
            .read(mode.allows_read())
            .write(mode.contains(AccessMode::WRITE))
            .append(mode.contains(AccessMode::APPEND))
            .truncate(mode.truncates())
            .create(mode.allows_write())
            .open(&file_path)?;
        debug!("Opened {} ({})", file_path.display(), mode);

        Ok(Box::new(ModeStream::new(file, mode)))
    }
}
