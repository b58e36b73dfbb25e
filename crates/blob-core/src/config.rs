//! Configuration for stores and plugin discovery.
//!
//! Configuration is stored in TOML format. Every section and field has a
//! default, so an empty document is a valid configuration.
//!
//! # Examples
//!
//! ```toml
//! [archive]
//! compression = "deflated"
//! separator = "/"
//!
//! [discovery]
//! manifest_name = "plugin.json"
//! verify_checksums = true
//! ```
//!
//! ```
//! use blob_core::{Compression, StoreConfig};
//!
//! let config = StoreConfig::from_toml_str("[archive]\ncompression = \"stored\"\n").unwrap();
//! assert_eq!(config.archive.compression, Compression::Stored);
//! assert_eq!(config.discovery.manifest_name, "plugin.json");
//! ```

use crate::error::ConfigError;
use crate::key::Key;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StoreConfig {
    /// Archive backend settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Plugin discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl StoreConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, and the
    /// errors of [`StoreConfig::from_toml_str`] otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!("Loaded store config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Renders the configuration as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if rendering fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.archive.validate()?;
        self.discovery.validate()
    }
}

/// Compression used for entries written to an archive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Entries are stored uncompressed.
    Stored,
    /// Entries are deflate-compressed.
    #[default]
    Deflated,
}

/// Archive backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Compression for entries written during a session.
    ///
    /// Default: deflated
    pub compression: Compression,

    /// Separator used when naming new archive entries.
    ///
    /// Both `/` and `\` are always accepted when reading.
    /// Default: `/`
    pub separator: char,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Deflated,
            separator: '/',
        }
    }
}

impl ArchiveConfig {
    /// Validates the archive settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the separator is not `/` or `\`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.separator, '/' | '\\') {
            return Err(ConfigError::Invalid {
                field: "archive.separator".to_string(),
                reason: format!("expected '/' or '\\', got '{}'", self.separator),
            });
        }
        Ok(())
    }
}

/// Plugin discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Name of the manifest element inside each candidate store.
    ///
    /// Default: `plugin.json`
    pub manifest_name: String,

    /// Verify blake3 checksums listed in manifests.
    ///
    /// Default: true
    pub verify_checksums: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            manifest_name: "plugin.json".to_string(),
            verify_checksums: true,
        }
    }
}

impl DiscoveryConfig {
    /// Returns the manifest name as a key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the name is not a valid key.
    pub fn manifest_key(&self) -> Result<Key, ConfigError> {
        Key::try_new(self.manifest_name.as_str()).map_err(|e| ConfigError::Invalid {
            field: "discovery.manifest_name".to_string(),
            reason: e.to_string(),
        })
    }

    /// Validates the discovery settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the manifest name is not a key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.manifest_key().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.archive.compression, Compression::Deflated);
        assert_eq!(config.archive.separator, '/');
        assert!(config.discovery.verify_checksums);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = StoreConfig::from_toml_str(
            r#"
            [discovery]
            verify_checksums = false
            "#,
        )
        .unwrap();
        assert!(!config.discovery.verify_checksums);
        assert_eq!(config.discovery.manifest_name, "plugin.json");
        assert_eq!(config.archive, ArchiveConfig::default());
    }

    #[test]
    fn test_invalid_separator_rejected() {
        let err = StoreConfig::from_toml_str("[archive]\nseparator = \":\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "archive.separator"));
    }

    #[test]
    fn test_invalid_manifest_name_rejected() {
        let err =
            StoreConfig::from_toml_str("[discovery]\nmanifest_name = \"a/b.json\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_compression_is_parse_error() {
        let err = StoreConfig::from_toml_str("[archive]\ncompression = \"zstd\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_roundtrip_through_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blobkit.toml");

        let config = StoreConfig {
            archive: ArchiveConfig {
                compression: Compression::Stored,
                separator: '\\',
            },
            discovery: DiscoveryConfig {
                manifest_name: "component.json".to_string(),
                verify_checksums: false,
            },
        };
        fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = StoreConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = StoreConfig::load(temp.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
