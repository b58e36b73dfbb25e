//! Plugin identities and interface identifiers.

use crate::error::{PluginError, PluginResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Globally unique identity of a discovered plugin.
///
/// Discovery uses it as the deduplication key: when two candidates report
/// the same id, the one discovered last wins.
///
/// # Examples
///
/// ```
/// use blob_plugin::PluginId;
///
/// let id: PluginId = "6f1c2a5e-3b1d-4c7a-9f0e-2d4b8a6c1e3f".parse().unwrap();
/// assert_eq!(id.to_string(), "6f1c2a5e-3b1d-4c7a-9f0e-2d4b8a6c1e3f");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(Uuid);

impl PluginId {
    /// Generates a new random id.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PluginId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of the interface a plugin is asked to implement.
///
/// Interface ids are compared exactly (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceId(String);

impl InterfaceId {
    /// Creates an interface id from trusted text.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or whitespace. Use [`InterfaceId::try_new`]
    /// for untrusted input.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        match Self::try_new(name) {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates an interface id, rejecting empty text.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidInterface`] if `name` is empty or
    /// whitespace.
    pub fn try_new(name: impl Into<String>) -> PluginResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PluginError::InvalidInterface {
                reason: "interface id cannot be empty".to_string(),
            });
        }
        Ok(Self(name))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InterfaceId {
    type Error = PluginError;

    fn try_from(value: String) -> PluginResult<Self> {
        Self::try_new(value)
    }
}

impl From<InterfaceId> for String {
    fn from(id: InterfaceId) -> Self {
        id.0
    }
}

/// One discovered component: its identity and fully-qualified type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique identity used for deduplication
    pub id: PluginId,
    /// Fully-qualified type name of the component
    pub type_name: String,
}

impl PluginInfo {
    /// Creates a plugin info.
    #[must_use]
    pub fn new(id: PluginId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
        }
    }
}
