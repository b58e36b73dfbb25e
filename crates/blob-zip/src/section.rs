//! Folder-tree reconstruction from a flat zip entry list.
//!
//! A zip archive only stores full entry names such as `a/b/c.txt`. At open
//! time every name is split into an [`EntryDescriptor`] (folder path plus
//! leaf key), and [`Section::build`] turns the descriptor list into an
//! in-memory tree mirroring the archive's namespace.

use blob_core::{Key, KeyPath, Result, StoreError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// One physical archive entry, split into folder path and leaf key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// Folder portion of the entry name (empty for top-level entries)
    pub path: KeyPath,
    /// Leaf name of the entry
    pub key: Key,
    /// Full entry name as stored in the archive
    pub entry_name: String,
}

impl EntryDescriptor {
    /// Returns the full path of the entry (`path` followed by `key`).
    #[must_use]
    pub fn full_path(&self) -> KeyPath {
        self.path.concat(&self.key)
    }
}

/// Result of splitting one raw entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedEntry {
    /// A file entry.
    Element(EntryDescriptor),
    /// An explicit directory entry (name ends with a separator).
    Folder(KeyPath),
}

/// Splits a raw zip entry name on `/` and `\`.
///
/// Names ending with a separator are directory entries. Empty segments are
/// ignored, so `a//b.txt` and `/a/b.txt` both address `b.txt` in folder `a`.
pub(crate) fn parse_entry_name(name: &str) -> Result<ParsedEntry> {
    let path = KeyPath::parse(name).map_err(|e| StoreError::Malformed {
        path: name.to_string(),
        reason: "entry name is not a valid path".to_string(),
        source: Some(Box::new(e)),
    })?;

    if name.ends_with(['/', '\\']) {
        return Ok(ParsedEntry::Folder(path));
    }

    match (path.parent(), path.last()) {
        (Some(folder), Some(key)) => Ok(ParsedEntry::Element(EntryDescriptor {
            path: folder,
            key: key.clone(),
            entry_name: name.to_string(),
        })),
        _ => Err(StoreError::Malformed {
            path: name.to_string(),
            reason: "entry name has no segments".to_string(),
            source: None,
        }),
    }
}

/// Content of one element in a section.
pub(crate) enum Content {
    /// Unchanged since open; read from the archive by entry name.
    Archived,
    /// Written during this session.
    Staged(Vec<u8>),
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archived => f.write_str("Archived"),
            Self::Staged(bytes) => write!(f, "Staged({} bytes)", bytes.len()),
        }
    }
}

/// One element of a section.
#[derive(Debug)]
pub(crate) struct Element {
    /// Entry name used when the archive is written back
    pub(crate) entry_name: String,
    pub(crate) content: Content,
}

/// A node of the reconstructed folder tree.
#[derive(Debug)]
pub(crate) struct Section {
    pub(crate) path: KeyPath,
    pub(crate) children: BTreeMap<Key, Section>,
    pub(crate) elements: BTreeMap<Key, Element>,
    /// Entry names hidden by a later entry whose key differs only in case
    pub(crate) shadowed: Vec<String>,
}

impl Section {
    pub(crate) const fn empty(path: KeyPath) -> Self {
        Self {
            path,
            children: BTreeMap::new(),
            elements: BTreeMap::new(),
            shadowed: Vec::new(),
        }
    }

    /// Builds the whole tree rooted at the empty path.
    ///
    /// `folders` are the explicit directory entries of the archive; the
    /// ancestors of every descriptor path are added implicitly.
    pub(crate) fn build(descriptors: &[EntryDescriptor], folders: &[KeyPath]) -> Self {
        let mut all_folders = BTreeSet::new();
        for path in descriptors.iter().map(|d| &d.path).chain(folders) {
            for depth in 1..=path.depth() {
                all_folders.insert(path.prefix(depth));
            }
        }
        Self::build_at(&KeyPath::root(), &all_folders, descriptors)
    }

    /// Builds the section for `base`.
    ///
    /// Direct child folders are the folder paths one level deeper than
    /// `base` that start with `base`; direct elements are the descriptors
    /// whose folder path equals `base`.
    fn build_at(
        base: &KeyPath,
        folders: &BTreeSet<KeyPath>,
        descriptors: &[EntryDescriptor],
    ) -> Self {
        let mut section = Self::empty(base.clone());

        for folder in folders
            .iter()
            .filter(|p| p.depth() == base.depth() + 1 && p.starts_with(base))
        {
            if let Some(name) = folder.last() {
                let child = Self::build_at(folder, folders, descriptors);
                section.children.insert(name.clone(), child);
            }
        }

        for descriptor in descriptors.iter().filter(|d| &d.path == base) {
            let element = Element {
                entry_name: descriptor.entry_name.clone(),
                content: Content::Archived,
            };
            if let Some(hidden) = section.elements.insert(descriptor.key.clone(), element) {
                debug!(
                    "Archive entry {} shadows {}",
                    descriptor.entry_name, hidden.entry_name
                );
                section.shadowed.push(hidden.entry_name);
            }
        }

        section
    }

    /// Finds the section at `path` below this one.
    pub(crate) fn descend(&self, path: &[Key]) -> Option<&Self> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self.children.get(head)?.descend(rest),
        }
    }

    /// Finds the section at `path` below this one, mutably.
    pub(crate) fn descend_mut(&mut self, path: &[Key]) -> Option<&mut Self> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self.children.get_mut(head)?.descend_mut(rest),
        }
    }

    /// Counts the elements in this section and every section below it.
    pub(crate) fn element_count(&self) -> usize {
        self.elements.len()
            + self
                .children
                .values()
                .map(Self::element_count)
                .sum::<usize>()
    }
}
