//! The storage capability contract.
//!
//! Every backend (directory tree, zip archive, embedded resources) implements
//! [`BlobStore`] so that traversal and discovery code never depends on a
//! specific backend.

use crate::error::{Result, StoreError};
use crate::key::{Key, KeyPath};
use crate::mode::AccessMode;
use crate::stream::BlobStream;
use std::collections::BTreeSet;
use std::fmt;
use std::io::{Read, Write};

/// Finite sequence of element keys.
///
/// Each call to [`BlobStore::enumerate`] returns a fresh, independent
/// sequence. Backends either produce keys lazily as the sequence is consumed
/// or hand out a snapshot of the keys present when `enumerate` was called.
pub type Elements<'a> = Box<dyn Iterator<Item = Key> + 'a>;

/// Hierarchical, key-addressed storage of elements and child stores.
///
/// # Navigation
///
/// Navigating never renames a store in place: [`get_child_store`] always
/// returns a new instance scoped one level deeper. The returned store
/// borrows its parent and cannot outlive it. Asking for a child that does
/// not exist yields a [`NullStore`](crate::NullStore) rather than an error,
/// so traversal code can recurse speculatively.
///
/// # Errors
///
/// Expected failures (missing element, unsupported write) come back as
/// [`StoreError`]. Operations on a store whose backend resource was already
/// released fail with [`StoreError::Disposed`].
///
/// [`get_child_store`]: BlobStore::get_child_store
pub trait BlobStore: fmt::Debug {
    /// Absolute address of this store within its backend.
    fn identifier(&self) -> &KeyPath;

    /// Returns `true` if writes and erases are rejected.
    fn is_read_only(&self) -> bool;

    /// Returns `true` iff an element (not a folder) named `key` exists
    /// directly in this store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    fn exists(&self, key: &Key) -> Result<bool>;

    /// Removes the element named `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unsupported`] on read-only stores and
    /// [`StoreError::NotFound`] if the element does not exist.
    fn erase(&self, key: &Key) -> Result<()>;

    /// Returns `true` if a child store named `key` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    fn has_child_store(&self, key: &Key) -> Result<bool>;

    /// Returns the keys of every direct child store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be listed.
    fn get_child_store_keys(&self) -> Result<BTreeSet<Key>>;

    /// Returns the child store named `key`, or an empty store if none exists.
    ///
    /// The child is read-only if this store is read-only or `read_only` is
    /// `true`.
    ///
    /// # Errors
    ///
    /// Only fails if the backend cannot be queried; a missing child is not
    /// an error.
    fn get_child_store(&self, key: &Key, read_only: bool) -> Result<Box<dyn BlobStore + '_>>;

    /// Creates (or returns the existing) child store named `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unsupported`] unless the backend can create
    /// folders and this store is writable.
    fn create_child_store(&self, key: &Key) -> Result<Box<dyn BlobStore + '_>> {
        let _ = key;
        Err(StoreError::unsupported("create_child_store", self.identifier()))
    }

    /// Lists the direct elements of this store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be listed.
    fn enumerate(&self) -> Result<Elements<'_>>;

    /// Opens the element named `key` with the given access mode.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidAccessMode`] for an empty mode,
    /// [`StoreError::Unsupported`] for writes on read-only stores, and
    /// backend-specific errors otherwise.
    fn open_stream(&self, key: &Key, mode: AccessMode) -> Result<Box<dyn BlobStream + '_>>;

    /// Reads the whole content of an element.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`open_stream`](BlobStore::open_stream) and the
    /// read itself.
    fn read_element(&self, key: &Key) -> Result<Vec<u8>> {
        let mut stream = self.open_stream(key, AccessMode::READ)?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Replaces the content of an element, creating it if needed.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`open_stream`](BlobStore::open_stream) and the
    /// write itself.
    fn write_element(&self, key: &Key, data: &[u8]) -> Result<()> {
        let mut stream = self.open_stream(key, AccessMode::WRITE)?;
        stream.write_all(data)?;
        stream.flush()?;
        Ok(())
    }
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    fn identifier(&self) -> &KeyPath {
        (**self).identifier()
    }

    fn is_read_only(&self) -> bool {
        (**self).is_read_only()
    }

    fn exists(&self, key: &Key) -> Result<bool> {
        (**self).exists(key)
    }

    fn erase(&self, key: &Key) -> Result<()> {
        (**self).erase(key)
    }

    fn has_child_store(&self, key: &Key) -> Result<bool> {
        (**self).has_child_store(key)
    }

    fn get_child_store_keys(&self) -> Result<BTreeSet<Key>> {
        (**self).get_child_store_keys()
    }

    fn get_child_store(&self, key: &Key, read_only: bool) -> Result<Box<dyn BlobStore + '_>> {
        (**self).get_child_store(key, read_only)
    }

    fn create_child_store(&self, key: &Key) -> Result<Box<dyn BlobStore + '_>> {
        (**self).create_child_store(key)
    }

    fn enumerate(&self) -> Result<Elements<'_>> {
        (**self).enumerate()
    }

    fn open_stream(&self, key: &Key, mode: AccessMode) -> Result<Box<dyn BlobStream + '_>> {
        (**self).open_stream(key, mode)
    }
}
