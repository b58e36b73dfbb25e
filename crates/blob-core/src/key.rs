//! Addressing types: single-segment [`Key`] and hierarchical [`KeyPath`].
//!
//! Keys are case-normalized: `Readme.TXT` and `readme.txt` address the same
//! element on every backend. The original spelling is kept for display and
//! for creating new backend entries.
//!
//! # Examples
//!
//! ```
//! use blob_core::{Key, KeyPath};
//!
//! let path = KeyPath::parse("Plugins/Alpha").unwrap();
//! let child = path.concat(&Key::new("bin"));
//!
//! assert_eq!(child.depth(), 3);
//! assert_eq!(child.to_string(), "Plugins/Alpha/bin");
//! assert_eq!(child, KeyPath::parse("plugins\\alpha\\BIN").unwrap());
//! ```

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Characters accepted as path separators when parsing paths.
pub(crate) const SEPARATORS: [char; 2] = ['/', '\\'];

/// One path segment identifying an element or child store.
///
/// Equality, ordering and hashing use the case-folded form; [`Key::as_str`]
/// returns the spelling the key was created with.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    text: String,
    folded: String,
}

impl Key {
    /// Creates a key from trusted text.
    ///
    /// # Panics
    ///
    /// Panics if `text` is empty, is `.` or `..`, or contains `/` or `\`. Use
    /// [`Key::try_new`] for untrusted input.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        match Self::try_new(text) {
            Ok(key) => key,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a key, rejecting empty text, `.`, `..` and text containing
    /// separators.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] if the text is not a valid segment.
    pub fn try_new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(StoreError::InvalidKey {
                key: text,
                reason: "key cannot be empty".to_string(),
            });
        }
        if text.contains(SEPARATORS) {
            return Err(StoreError::InvalidKey {
                key: text,
                reason: "key cannot contain path separators".to_string(),
            });
        }
        if text == "." || text == ".." {
            return Err(StoreError::InvalidKey {
                key: text,
                reason: "key cannot be a relative path component".to_string(),
            });
        }
        let folded = text.to_lowercase();
        Ok(Self { text, folded })
    }

    /// Returns the key as originally spelled.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the case-folded form used for comparisons.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.folded
    }

    /// Returns `true` if `text` names this key, ignoring case.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.folded == text.to_lowercase()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.text)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl FromStr for Key {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_new(s)
    }
}

impl TryFrom<String> for Key {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_new(value)
    }
}

impl TryFrom<&str> for Key {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_new(value)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.text
    }
}

/// Ordered, immutable sequence of keys forming a hierarchical address.
///
/// The empty path is the root of a backend. Two paths are equal iff they
/// have the same length and equal segments in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath {
    segments: Vec<Key>,
}

impl KeyPath {
    /// Returns the empty (root) path.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Creates a path from already-validated keys.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            segments: keys.into_iter().collect(),
        }
    }

    /// Parses a path, splitting on `/` and `\` and skipping empty segments.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] if a segment is not a valid key.
    pub fn parse(text: &str) -> Result<Self> {
        text.split(SEPARATORS)
            .filter(|segment| !segment.is_empty())
            .map(Key::try_new)
            .collect::<Result<Vec<_>>>()
            .map(|segments| Self { segments })
    }

    /// Returns a new path with `key` appended.
    #[must_use]
    pub fn concat(&self, key: &Key) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(key.clone());
        Self { segments }
    }

    /// Returns a new path with every segment of `other` appended.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(&other.segments);
        Self { segments }
    }

    /// Returns the path without its last segment, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.segments.split_last().map(|(_, head)| Self {
            segments: head.to_vec(),
        })
    }

    /// Returns the last segment, or `None` for the root.
    #[must_use]
    pub fn last(&self) -> Option<&Key> {
        self.segments.last()
    }

    /// Returns the first `depth` segments as a new path.
    ///
    /// Returns the whole path if `depth` exceeds its length.
    #[must_use]
    pub fn prefix(&self, depth: usize) -> Self {
        Self {
            segments: self.segments[..depth.min(self.segments.len())].to_vec(),
        }
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if `base` is a (non-strict) prefix of this path.
    #[must_use]
    pub fn starts_with(&self, base: &Self) -> bool {
        self.segments.starts_with(&base.segments)
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Key] {
        &self.segments
    }

    /// Renders the path with the given separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use blob_core::KeyPath;
    ///
    /// let path = KeyPath::parse("app/resources/icons").unwrap();
    /// assert_eq!(path.render("."), "app.resources.icons");
    /// ```
    #[must_use]
    pub fn render(&self, separator: &str) -> String {
        self.segments
            .iter()
            .map(Key::as_str)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("/"))
    }
}

impl FromStr for KeyPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Key> for KeyPath {
    fn from(key: Key) -> Self {
        Self {
            segments: vec![key],
        }
    }
}

impl FromIterator<Key> for KeyPath {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self::from_keys(iter)
    }
}
