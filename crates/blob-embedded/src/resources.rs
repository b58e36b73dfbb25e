//! Lookup tables mapping qualified resource names to bytes.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Joins a namespace and a dotted suffix into a qualified resource name.
///
/// An empty namespace yields the suffix unchanged.
///
/// # Examples
///
/// ```
/// use blob_embedded::qualify;
///
/// assert_eq!(qualify("app.icons", "logo.png"), "app.icons.logo.png");
/// assert_eq!(qualify("", "logo.png"), "logo.png");
/// ```
#[must_use]
pub fn qualify(namespace: &str, suffix: &str) -> String {
    if namespace.is_empty() {
        suffix.to_string()
    } else {
        format!("{namespace}.{suffix}")
    }
}

/// Source of resource bytes keyed by qualified name.
///
/// Lookups are case-insensitive, consistent with key equality.
pub trait ResourceTable: fmt::Debug {
    /// Returns the bytes of the resource named `qualified`, if present.
    fn open(&self, qualified: &str) -> Option<Cow<'_, [u8]>>;
}

/// A table over a `'static` slice, typically built from `include_bytes!`.
///
/// # Examples
///
/// ```
/// use blob_embedded::{ResourceTable, StaticResources};
///
/// static TABLE: &[(&str, &[u8])] = &[("app.readme.txt", b"hello")];
///
/// let table = StaticResources::new(TABLE);
/// assert_eq!(table.open("App.README.txt").as_deref(), Some(&b"hello"[..]));
/// assert!(table.open("app.missing").is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StaticResources {
    entries: &'static [(&'static str, &'static [u8])],
}

impl StaticResources {
    /// Wraps a static `(qualified name, bytes)` table.
    #[must_use]
    pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { entries }
    }

    /// Qualified names of every entry, in table order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + use<> {
        self.entries.iter().map(|(name, _)| *name)
    }
}

impl ResourceTable for StaticResources {
    fn open(&self, qualified: &str) -> Option<Cow<'_, [u8]>> {
        let wanted = qualified.to_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, bytes)| Cow::Borrowed(*bytes))
    }
}

/// An owned, case-insensitive resource table.
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    entries: HashMap<String, Vec<u8>>,
}

impl ResourceMap {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource.
    pub fn insert(&mut self, qualified: &str, bytes: Vec<u8>) {
        self.entries.insert(qualified.to_lowercase(), bytes);
    }

    /// Number of resources in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceTable for ResourceMap {
    fn open(&self, qualified: &str) -> Option<Cow<'_, [u8]>> {
        self.entries
            .get(&qualified.to_lowercase())
            .map(|bytes| Cow::Borrowed(bytes.as_slice()))
    }
}

/// Two tables searched in order.
#[derive(Debug)]
pub(crate) struct Layered<A, B> {
    pub(crate) first: A,
    pub(crate) second: B,
}

impl<A: ResourceTable, B: ResourceTable> ResourceTable for Layered<A, B> {
    fn open(&self, qualified: &str) -> Option<Cow<'_, [u8]>> {
        self.first
            .open(qualified)
            .or_else(|| self.second.open(qualified))
    }
}

impl<T: ResourceTable + ?Sized> ResourceTable for std::sync::Arc<T> {
    fn open(&self, qualified: &str) -> Option<Cow<'_, [u8]>> {
        (**self).open(qualified)
    }
}
