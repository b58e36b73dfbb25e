//! Error types for plugin discovery and loading.

use blob_core::{ConfigError, ErrorKind, StoreError};

/// Result type for plugin operations.
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Errors reported by factories and the discovery orchestrator.
///
/// Every expected outcome of inspecting a candidate (no manifest, wrong
/// interface, corrupt content) is one of these variants. Discovery logs and
/// skips them; only [`is_fatal`](Self::is_fatal) errors abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum PluginError {
    /// The named candidate store does not exist under the root.
    #[error("Plugin store not found: {key} in '{store}'")]
    StoreNotFound {
        /// Key that was looked up
        key: String,
        /// Identifier of the root store
        store: String,
    },

    /// The candidate store has no manifest element.
    #[error("No {manifest} in plugin store '{store}'")]
    ManifestMissing {
        /// Identifier of the candidate store
        store: String,
        /// Name of the manifest element that was expected
        manifest: String,
    },

    /// The manifest exists but could not be parsed.
    #[error("Malformed manifest in plugin store '{store}': {source}")]
    MalformedManifest {
        /// Identifier of the candidate store
        store: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// An element listed in the manifest does not match its checksum.
    ///
    /// # Security
    ///
    /// The candidate content may be corrupted or tampered with and must not
    /// be used.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Path of the element within the candidate store
        path: String,
        /// Checksum recorded in the manifest
        expected: String,
        /// Checksum of the actual content
        actual: String,
    },

    /// The manifest lists a checksum for a path that cannot name an element.
    #[error("Invalid checksum path '{path}' in plugin store '{store}': {source}")]
    InvalidChecksumPath {
        /// Identifier of the candidate store
        store: String,
        /// Path as written in the manifest
        path: String,
        /// Why the path was rejected
        #[source]
        source: StoreError,
    },

    /// The candidate's type does not implement the requested interface.
    #[error("Type {type_name} does not implement {interface}")]
    InterfaceNotImplemented {
        /// Type named by the candidate
        type_name: String,
        /// Interface that was requested
        interface: String,
    },

    /// The candidate names a type that no factory knows about.
    #[error("Unknown plugin type: {type_name}")]
    UnknownType {
        /// Type named by the candidate
        type_name: String,
    },

    /// An interface identifier was empty.
    #[error("Invalid interface id: {reason}")]
    InvalidInterface {
        /// Why the identifier was rejected
        reason: String,
    },

    /// Discovery configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A factory failed for a reason of its own.
    #[error("Factory error: {message}")]
    Factory {
        /// Error message
        message: String,
        /// Optional underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A store operation failed while inspecting a candidate.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PluginError {
    /// Builds a [`PluginError::Factory`] error without a cause.
    #[must_use]
    pub fn factory(message: impl Into<String>) -> Self {
        Self::Factory {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::StoreNotFound { .. } | Self::ManifestMissing { .. } | Self::UnknownType { .. } => {
                ErrorKind::NotFound
            }
            Self::MalformedManifest { .. }
            | Self::InvalidChecksumPath { .. }
            | Self::ChecksumMismatch { .. }
            | Self::Factory { .. } => ErrorKind::Malformed,
            Self::InterfaceNotImplemented { .. } => ErrorKind::Unsupported,
            Self::InvalidInterface { .. } | Self::Config(_) => ErrorKind::ContractViolation,
            Self::Store(e) => e.kind(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }

    /// Returns `true` if this is a security-related error.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }

    /// Returns `true` if this error must abort a whole scan.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blob_core::KeyPath;

    #[test]
    fn test_kind_mapping() {
        let err = PluginError::StoreNotFound {
            key: "missing".to_string(),
            store: String::new(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_not_found());
        assert!(!err.is_fatal());

        let err = PluginError::InterfaceNotImplemented {
            type_name: "demo::Exporter".to_string(),
            interface: "blobkit.Importer".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Unsupported);

        let err = PluginError::factory("boom");
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invalid_checksum_path_is_not_fatal() {
        let source = KeyPath::parse("../x").unwrap_err();
        assert!(source.is_fatal());

        let err = PluginError::InvalidChecksumPath {
            store: "plugins/evil".to_string(),
            path: "../x".to_string(),
            source,
        };
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_store_errors_keep_their_kind() {
        let err: PluginError = StoreError::disposed(&KeyPath::root()).into();
        assert_eq!(err.kind(), ErrorKind::Disposed);
        assert!(err.is_fatal());

        let err: PluginError = StoreError::not_found(&KeyPath::root(), "x").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Element not found: x");
    }

    #[test]
    fn test_checksum_mismatch_is_security_error() {
        let err = PluginError::ChecksumMismatch {
            path: "bin/plugin.wasm".to_string(),
            expected: "blake3:aa".to_string(),
            actual: "blake3:bb".to_string(),
        };
        assert!(err.is_security_error());
        assert!(err.to_string().contains("bin/plugin.wasm"));
    }

    #[test]
    fn test_malformed_manifest_has_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = PluginError::MalformedManifest {
            store: "alpha".to_string(),
            source,
        };
        assert_eq!(err.kind(), ErrorKind::Malformed);

        use std::error::Error;
        assert!(err.source().is_some());
    }
}
