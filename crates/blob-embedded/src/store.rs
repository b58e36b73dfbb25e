//! Immutable [`BlobStore`] over a precomputed resource namespace.

use crate::resources::{ResourceTable, qualify};
use blob_core::{
    AccessMode, BlobStore, BlobStream, Elements, Key, KeyPath, ModeStream, NullStore, Result,
    StoreError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// One namespace of compiled-in resources.
///
/// The element names and child namespaces are fixed at construction; the
/// store never changes afterwards. Every write-type operation fails with
/// [`StoreError::Unsupported`].
///
/// Reads are lenient: opening a name that the resource table cannot resolve
/// yields an empty stream rather than an error.
#[derive(Debug, Clone)]
pub struct EmbeddedStore {
    path: KeyPath,
    namespace: String,
    elements: BTreeSet<Key>,
    children: BTreeMap<Key, EmbeddedStore>,
    resources: Arc<dyn ResourceTable + Send + Sync>,
}

impl EmbeddedStore {
    /// Assembles one namespace from already-built parts.
    ///
    /// `namespace` is the dotted qualified prefix of this namespace's
    /// resources and `path` its address within the tree. Most callers use
    /// [`EmbeddedStoreBuilder`](crate::EmbeddedStoreBuilder) instead.
    #[must_use]
    pub fn new(
        path: KeyPath,
        namespace: impl Into<String>,
        elements: BTreeSet<Key>,
        children: BTreeMap<Key, Self>,
        resources: Arc<dyn ResourceTable + Send + Sync>,
    ) -> Self {
        Self {
            path,
            namespace: namespace.into(),
            elements,
            children,
            resources,
        }
    }

    /// Local name of this namespace (`None` for the root).
    #[must_use]
    pub fn name(&self) -> Option<&Key> {
        self.path.last()
    }

    /// Dotted qualified prefix of this namespace's resources.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the child namespace named `key`, if any.
    #[must_use]
    pub fn child(&self, key: &Key) -> Option<&Self> {
        self.children.get(key)
    }

    /// Qualified resource name for element `key` of this namespace.
    ///
    /// Declared elements use their declared spelling.
    #[must_use]
    pub fn qualified_name(&self, key: &Key) -> String {
        let key = self.elements.get(key).unwrap_or(key);
        qualify(&self.namespace, key.as_str())
    }
}

impl BlobStore for EmbeddedStore {
    fn identifier(&self) -> &KeyPath {
        &self.path
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn exists(&self, key: &Key) -> Result<bool> {
        Ok(self.elements.contains(key))
    }

    fn erase(&self, _key: &Key) -> Result<()> {
        Err(StoreError::unsupported("erase", &self.path))
    }

    fn has_child_store(&self, key: &Key) -> Result<bool> {
        Ok(self.children.contains_key(key))
    }

    fn get_child_store_keys(&self) -> Result<BTreeSet<Key>> {
        Ok(self.children.keys().cloned().collect())
    }

    fn get_child_store(&self, key: &Key, _read_only: bool) -> Result<Box<dyn BlobStore + '_>> {
        match self.children.get(key) {
            Some(child) => Ok(Box::new(child)),
            None => Ok(Box::new(NullStore::child_of(&self.path, key))),
        }
    }

    fn enumerate(&self) -> Result<Elements<'_>> {
        Ok(Box::new(self.elements.iter().cloned()))
    }

    fn open_stream(&self, key: &Key, mode: AccessMode) -> Result<Box<dyn BlobStream + '_>> {
        let mode = mode.validate()?;
        if mode.allows_write() {
            return Err(StoreError::unsupported("open_stream(write)", &self.path));
        }

        let qualified = self.qualified_name(key);
        let bytes = if let Some(bytes) = self.resources.open(&qualified) {
            bytes.into_owned()
        } else {
            debug!("Embedded resource {} not found, returning empty stream", qualified);
            Vec::new()
        };
        Ok(Box::new(ModeStream::new(Cursor::new(bytes), mode)))
    }
}
