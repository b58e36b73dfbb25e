//! Error types for blob store operations.
//!
//! Every expected failure (missing element, unsupported write, malformed
//! archive) is reported through [`StoreError`]. Callers classify errors with
//! [`StoreError::kind`] rather than matching on individual variants.
//!
//! # Examples
//!
//! ```
//! use blob_core::{ErrorKind, StoreError};
//!
//! let err = StoreError::NotFound {
//!     path: "plugins/alpha.json".to_string(),
//! };
//! assert!(err.is_not_found());
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! ```

use crate::key::KeyPath;
use crate::mode::AccessMode;
use std::fmt;
use thiserror::Error;

/// Classification of a [`StoreError`].
///
/// Mirrors the error taxonomy shared by the store and discovery layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required argument was invalid. Fatal to the call.
    ContractViolation,
    /// The requested element or child store does not exist.
    NotFound,
    /// The backend does not support the requested operation.
    Unsupported,
    /// Stored data could not be parsed into the expected structure.
    Malformed,
    /// The owning store was already released. Fatal to the call.
    Disposed,
    /// Underlying I/O failure.
    Io,
}

impl ErrorKind {
    /// Returns `true` for kinds that must abort the whole operation.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::ContractViolation | Self::Disposed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ContractViolation => "contract violation",
            Self::NotFound => "not found",
            Self::Unsupported => "unsupported",
            Self::Malformed => "malformed",
            Self::Disposed => "disposed",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during blob store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key text is empty or contains a path separator.
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key text
        key: String,
        /// Why the key was rejected
        reason: String,
    },

    /// Access mode requested no capability at all.
    #[error("Invalid access mode: {mode}")]
    InvalidAccessMode {
        /// The rejected mode
        mode: AccessMode,
    },

    /// Element does not exist in the store.
    #[error("Element not found: {path}")]
    NotFound {
        /// Rendered path of the missing element
        path: String,
    },

    /// Operation is not supported by this backend or store instance.
    #[error("Operation '{operation}' is not supported by store '{store}'")]
    Unsupported {
        /// Name of the rejected operation
        operation: &'static str,
        /// Identifier of the store that rejected it
        store: String,
    },

    /// Backend data could not be parsed.
    #[error("Malformed data in '{path}': {reason}")]
    Malformed {
        /// Rendered path of the malformed container or entry
        path: String,
        /// Description of the problem
        reason: String,
        /// Underlying parser error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The store (or the store owning this section) was already closed.
    #[error("Store '{path}' has been disposed")]
    Disposed {
        /// Identifier of the disposed store
        path: String,
    },

    /// I/O error from the underlying backend.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Builds an [`StoreError::Unsupported`] error for `store`.
    #[must_use]
    pub fn unsupported(operation: &'static str, store: &KeyPath) -> Self {
        Self::Unsupported {
            operation,
            store: store.to_string(),
        }
    }

    /// Builds a [`StoreError::NotFound`] error for an element of `store`.
    #[must_use]
    pub fn not_found(store: &KeyPath, name: impl fmt::Display) -> Self {
        let path = if store.is_empty() {
            name.to_string()
        } else {
            format!("{store}/{name}")
        };
        Self::NotFound { path }
    }

    /// Builds a [`StoreError::Disposed`] error for `store`.
    #[must_use]
    pub fn disposed(store: &KeyPath) -> Self {
        Self::Disposed {
            path: store.to_string(),
        }
    }

    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKey { .. } | Self::InvalidAccessMode { .. } => ErrorKind::ContractViolation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::Disposed { .. } => ErrorKind::Disposed,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an unsupported operation error.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Returns `true` if this error must abort the whole operation.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration text is not valid TOML for the expected schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be rendered to TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field holds a value outside its accepted range.
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted name of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
