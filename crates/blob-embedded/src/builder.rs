//! Builder for embedded resource trees.

use crate::resources::{Layered, ResourceMap, ResourceTable};
use crate::store::EmbeddedStore;
use blob_core::{Key, KeyPath, Result, StoreError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Builds an [`EmbeddedStore`] tree from resource paths.
///
/// Paths use `/` (or `\`) between namespaces; the last segment is the
/// element name. A resource at `icons/logo.png` under namespace `app` is
/// looked up as `app.icons.logo.png`. Invalid paths are collected and the
/// first one is reported by [`build`](Self::build).
///
/// # Examples
///
/// ```
/// use blob_core::{BlobStore, Key};
/// use blob_embedded::{EmbeddedStoreBuilder, StaticResources};
///
/// static TABLE: &[(&str, &[u8])] = &[("app.fonts.mono.ttf", b"font")];
///
/// let store = EmbeddedStoreBuilder::with_table("app", StaticResources::new(TABLE))
///     .declare("fonts/mono.ttf")
///     .build()
///     .unwrap();
///
/// let fonts = store.get_child_store(&Key::new("fonts"), true).unwrap();
/// assert_eq!(fonts.read_element(&Key::new("mono.ttf")).unwrap(), b"font");
/// ```
#[derive(Debug)]
pub struct EmbeddedStoreBuilder {
    namespace: String,
    table: Option<Arc<dyn ResourceTable + Send + Sync>>,
    resources: ResourceMap,
    declared: Vec<KeyPath>,
    errors: Vec<StoreError>,
}

impl EmbeddedStoreBuilder {
    /// Creates a builder whose resources are added with
    /// [`resource`](Self::resource).
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: None,
            resources: ResourceMap::new(),
            declared: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Creates a builder over an existing resource table.
    ///
    /// Names present in the table still have to be made visible with
    /// [`declare`](Self::declare). Resources added with
    /// [`resource`](Self::resource) take precedence over the table.
    #[must_use]
    pub fn with_table(
        namespace: impl Into<String>,
        table: impl ResourceTable + Send + Sync + 'static,
    ) -> Self {
        let mut builder = Self::new(namespace);
        builder.table = Some(Arc::new(table));
        builder
    }

    /// Adds a resource and declares its path.
    #[must_use]
    pub fn resource(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        if let Some(path) = self.parse(path) {
            let qualified = crate::qualify(&self.namespace, &path.render("."));
            self.resources.insert(&qualified, bytes.into());
            self.declared.push(path);
        }
        self
    }

    /// Declares an element path whose bytes come from the resource table.
    ///
    /// A declared name with no matching resource reads as empty.
    #[must_use]
    pub fn declare(mut self, path: &str) -> Self {
        if let Some(path) = self.parse(path) {
            self.declared.push(path);
        }
        self
    }

    fn parse(&mut self, text: &str) -> Option<KeyPath> {
        match KeyPath::parse(text) {
            Ok(path) if !path.is_empty() => Some(path),
            Ok(_) => {
                self.errors.push(StoreError::InvalidKey {
                    key: text.to_string(),
                    reason: "resource path cannot be empty".to_string(),
                });
                None
            }
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    /// Consumes the builder and constructs the whole tree.
    ///
    /// # Errors
    ///
    /// Returns the first invalid resource path, if any.
    pub fn build(mut self) -> Result<EmbeddedStore> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        let resources: Arc<dyn ResourceTable + Send + Sync> = match self.table {
            None => Arc::new(self.resources),
            Some(table) if self.resources.is_empty() => table,
            Some(table) => Arc::new(Layered {
                first: self.resources,
                second: table,
            }),
        };

        debug!(
            "Building embedded namespace '{}' with {} resources",
            self.namespace,
            self.declared.len()
        );
        Ok(build_node(
            KeyPath::root(),
            self.namespace,
            &self.declared,
            &resources,
        ))
    }
}

/// Builds the namespace at `path` from element paths relative to it.
fn build_node(
    path: KeyPath,
    namespace: String,
    relative: &[KeyPath],
    resources: &Arc<dyn ResourceTable + Send + Sync>,
) -> EmbeddedStore {
    let mut elements = BTreeSet::new();
    let mut nested: BTreeMap<Key, Vec<KeyPath>> = BTreeMap::new();

    for entry in relative {
        match entry.segments() {
            [] => {}
            [name] => {
                elements.insert(name.clone());
            }
            [head, rest @ ..] => nested
                .entry(head.clone())
                .or_default()
                .push(rest.iter().cloned().collect()),
        }
    }

    let children = nested
        .into_iter()
        .map(|(key, entries)| {
            let child = build_node(
                path.concat(&key),
                crate::qualify(&namespace, key.as_str()),
                &entries,
                resources,
            );
            (key, child)
        })
        .collect();

    EmbeddedStore::new(path, namespace, elements, children, Arc::clone(resources))
}
