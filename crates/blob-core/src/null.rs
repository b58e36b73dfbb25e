//! The always-empty store returned for missing children.

use crate::error::{Result, StoreError};
use crate::key::{Key, KeyPath};
use crate::mode::AccessMode;
use crate::store::{BlobStore, Elements};
use crate::stream::BlobStream;
use std::collections::BTreeSet;

/// A store with no elements and no children.
///
/// Backends return it from [`BlobStore::get_child_store`] when the
/// requested child does not exist. It is read-only: erases and writes fail
/// with [`StoreError::Unsupported`], reads with [`StoreError::NotFound`].
///
/// # Examples
///
/// ```
/// use blob_core::{BlobStore, Key, KeyPath, NullStore};
///
/// let store = NullStore::child_of(&KeyPath::root(), &Key::new("missing"));
/// let deeper = store.get_child_store(&Key::new("deeper"), false).unwrap();
///
/// assert_eq!(deeper.identifier().to_string(), "missing/deeper");
/// assert!(deeper.get_child_store_keys().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullStore {
    path: KeyPath,
}

impl NullStore {
    /// Creates an empty store addressed at `path`.
    #[must_use]
    pub const fn new(path: KeyPath) -> Self {
        Self { path }
    }

    /// Creates an empty store for the missing child `key` of `parent`.
    #[must_use]
    pub fn child_of(parent: &KeyPath, key: &Key) -> Self {
        Self {
            path: parent.concat(key),
        }
    }
}

impl BlobStore for NullStore {
    fn identifier(&self) -> &KeyPath {
        &self.path
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn exists(&self, _key: &Key) -> Result<bool> {
        Ok(false)
    }

    fn erase(&self, _key: &Key) -> Result<()> {
        Err(StoreError::unsupported("erase", &self.path))
    }

    fn has_child_store(&self, _key: &Key) -> Result<bool> {
        Ok(false)
    }

    fn get_child_store_keys(&self) -> Result<BTreeSet<Key>> {
        Ok(BTreeSet::new())
    }

    fn get_child_store(&self, key: &Key, _read_only: bool) -> Result<Box<dyn BlobStore + '_>> {
        Ok(Box::new(Self::child_of(&self.path, key)))
    }

    fn enumerate(&self) -> Result<Elements<'_>> {
        Ok(Box::new(std::iter::empty()))
    }

    fn open_stream(&self, key: &Key, mode: AccessMode) -> Result<Box<dyn BlobStream + '_>> {
        let mode = mode.validate()?;
        if mode.allows_write() {
            return Err(StoreError::unsupported("open_stream(write)", &self.path));
        }
        Err(StoreError::not_found(&self.path, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_store_is_empty() {
        let store = NullStore::new(KeyPath::parse("a/b").unwrap());
        let key = Key::new("x");

        assert!(!store.exists(&key).unwrap());
        assert!(!store.has_child_store(&key).unwrap());
        assert!(store.get_child_store_keys().unwrap().is_empty());
        assert_eq!(store.enumerate().unwrap().count(), 0);
        assert!(store.is_read_only());
    }

    #[test]
    fn test_null_store_rejects_mutation() {
        let store = NullStore::default();
        let key = Key::new("x");

        assert!(store.erase(&key).unwrap_err().is_unsupported());
        assert!(
            store
                .open_stream(&key, AccessMode::WRITE)
                .unwrap_err()
                .is_unsupported()
        );
        assert!(store.write_element(&key, b"data").unwrap_err().is_unsupported());
        assert!(store.create_child_store(&key).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_null_store_read_is_not_found() {
        let store = NullStore::default();
        let err = store.open_stream(&Key::new("x"), AccessMode::READ).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_null_store_rejects_empty_mode() {
        let store = NullStore::default();
        let err = store
            .open_stream(&Key::new("x"), AccessMode::empty())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAccessMode { .. }));
    }

    #[test]
    fn test_null_store_children_are_null_all_the_way_down() {
        let store = NullStore::default();
        let a = store.get_child_store(&Key::new("a"), false).unwrap();
        let b = a.get_child_store(&Key::new("b"), true).unwrap();

        assert_eq!(b.identifier(), &KeyPath::parse("a/b").unwrap());
        assert!(!b.has_child_store(&Key::new("c")).unwrap());
        assert_eq!(b.enumerate().unwrap().count(), 0);
    }
}
