//! Manifest-driven factory over a compile-time type registry.
//!
//! Each candidate store carries a JSON manifest (`plugin.json` by default):
//!
//! ```json
//! {
//!   "id": "6f1c2a5e-3b1d-4c7a-9f0e-2d4b8a6c1e3f",
//!   "type_name": "demo::CsvExporter",
//!   "interfaces": ["blobkit.Exporter"],
//!   "checksums": { "bin/exporter.wasm": "blake3:..." }
//! }
//! ```
//!
//! The manifest's type must be registered in a [`PluginRegistry`] as
//! implementing the requested interface, and every listed checksum must
//! match the element it names.

use crate::checksum::verify_checksum;
use crate::error::{PluginError, PluginResult};
use crate::factory::{FactoryHost, PluginFactory};
use crate::types::{InterfaceId, PluginId, PluginInfo};
use blob_core::{BlobStore, DiscoveryConfig, Key, KeyPath, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Parsed content of a candidate's manifest element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Identity of the plugin
    pub id: PluginId,
    /// Fully-qualified type name
    pub type_name: String,
    /// Interfaces the plugin declares
    #[serde(default)]
    pub interfaces: Vec<InterfaceId>,
    /// Element path (relative to the candidate store) to `blake3:<hex>`
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

/// Table of known plugin types and the interfaces each one implements.
///
/// # Examples
///
/// ```
/// use blob_plugin::{InterfaceId, PluginRegistry};
///
/// let registry = PluginRegistry::new()
///     .with("demo::CsvExporter", [InterfaceId::new("blobkit.Exporter")]);
///
/// assert_eq!(
///     registry.implements("demo::CsvExporter", &InterfaceId::new("blobkit.Exporter")),
///     Some(true)
/// );
/// assert_eq!(registry.implements("demo::Unknown", &InterfaceId::new("x")), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    types: BTreeMap<String, BTreeSet<InterfaceId>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `type_name` as implementing `interfaces`.
    ///
    /// Registering a type again adds to its interface set.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        interfaces: impl IntoIterator<Item = InterfaceId>,
    ) -> &mut Self {
        self.types
            .entry(type_name.into())
            .or_default()
            .extend(interfaces);
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(
        mut self,
        type_name: impl Into<String>,
        interfaces: impl IntoIterator<Item = InterfaceId>,
    ) -> Self {
        self.register(type_name, interfaces);
        self
    }

    /// Returns whether `type_name` implements `interface`, or `None` if the
    /// type is not registered.
    #[must_use]
    pub fn implements(&self, type_name: &str, interface: &InterfaceId) -> Option<bool> {
        self.types
            .get(type_name)
            .map(|interfaces| interfaces.contains(interface))
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Factory that reads a candidate's manifest and checks it against a
/// [`PluginRegistry`].
#[derive(Debug)]
pub struct ManifestFactory<'r> {
    registry: &'r PluginRegistry,
    manifest: &'r Key,
    verify_checksums: bool,
}

impl<'r> ManifestFactory<'r> {
    /// Creates a factory reading the manifest element `manifest`.
    #[must_use]
    pub const fn new(
        registry: &'r PluginRegistry,
        manifest: &'r Key,
        verify_checksums: bool,
    ) -> Self {
        Self {
            registry,
            manifest,
            verify_checksums,
        }
    }

    /// Reads and parses the manifest of `store`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ManifestMissing`] if there is no manifest and
    /// [`PluginError::MalformedManifest`] if it is not valid JSON for
    /// [`PluginManifest`].
    pub fn read_manifest(&self, store: &dyn BlobStore) -> PluginResult<PluginManifest> {
        if !store.exists(self.manifest)? {
            return Err(PluginError::ManifestMissing {
                store: store.identifier().to_string(),
                manifest: self.manifest.to_string(),
            });
        }
        let bytes = store.read_element(self.manifest)?;
        serde_json::from_slice(&bytes).map_err(|source| PluginError::MalformedManifest {
            store: store.identifier().to_string(),
            source,
        })
    }

    fn verify(store: &dyn BlobStore, manifest: &PluginManifest) -> PluginResult<()> {
        for (path, expected) in &manifest.checksums {
            let invalid = |source: StoreError| PluginError::InvalidChecksumPath {
                store: store.identifier().to_string(),
                path: path.clone(),
                source,
            };
            let target = KeyPath::parse(path).map_err(invalid)?;
            let Some((name, folders)) = target.segments().split_last() else {
                return Err(invalid(StoreError::InvalidKey {
                    key: path.clone(),
                    reason: "checksum path names no element".to_string(),
                }));
            };
            let data = read_nested(store, folders, name)?;
            verify_checksum(&data, expected, path)?;
        }
        Ok(())
    }
}

/// Reads the element `name` below `store`, descending through the child
/// stores named by `folders` first.
fn read_nested(store: &dyn BlobStore, folders: &[Key], name: &Key) -> PluginResult<Vec<u8>> {
    match folders.split_first() {
        None => Ok(store.read_element(name)?),
        Some((head, rest)) => {
            let child = store.get_child_store(head, true)?;
            read_nested(&*child, rest, name)
        }
    }
}

impl PluginFactory for ManifestFactory<'_> {
    fn find_plugin(
        &mut self,
        store: &dyn BlobStore,
        interface: &InterfaceId,
    ) -> PluginResult<PluginInfo> {
        let manifest = self.read_manifest(store)?;

        if self.verify_checksums {
            Self::verify(store, &manifest)?;
        }

        let registered = self
            .registry
            .implements(&manifest.type_name, interface)
            .ok_or_else(|| PluginError::UnknownType {
                type_name: manifest.type_name.clone(),
            })?;

        if !registered || !manifest.interfaces.contains(interface) {
            return Err(PluginError::InterfaceNotImplemented {
                type_name: manifest.type_name,
                interface: interface.to_string(),
            });
        }

        debug!(
            "Store '{}' provides {} as {}",
            store.identifier(),
            manifest.type_name,
            interface
        );
        Ok(PluginInfo::new(manifest.id, manifest.type_name))
    }
}

/// [`FactoryHost`] handing out [`ManifestFactory`] sessions.
///
/// Counts opened and closed scopes, which makes the scope bracket
/// observable.
#[derive(Debug)]
pub struct RegistryHost {
    registry: PluginRegistry,
    manifest: Key,
    verify_checksums: bool,
    opened: usize,
    closed: usize,
}

impl RegistryHost {
    /// Creates a host with the default discovery settings.
    #[must_use]
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry,
            manifest: Key::new("plugin.json"),
            verify_checksums: true,
            opened: 0,
            closed: 0,
        }
    }

    /// Creates a host with explicit discovery settings.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] if the manifest name is not a valid
    /// key.
    pub fn with_config(registry: PluginRegistry, config: &DiscoveryConfig) -> PluginResult<Self> {
        Ok(Self {
            manifest: config.manifest_key()?,
            verify_checksums: config.verify_checksums,
            ..Self::new(registry)
        })
    }

    /// The registry factories check candidates against.
    #[must_use]
    pub const fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Number of scopes opened so far.
    #[must_use]
    pub const fn opened_scopes(&self) -> usize {
        self.opened
    }

    /// Number of scopes closed so far.
    #[must_use]
    pub const fn closed_scopes(&self) -> usize {
        self.closed
    }
}

impl FactoryHost for RegistryHost {
    fn open_factory_scope(&mut self) -> PluginResult<()> {
        if self.opened != self.closed {
            return Err(PluginError::factory("a factory scope is already open"));
        }
        self.opened += 1;
        Ok(())
    }

    fn close_factory_scope(&mut self) {
        self.closed += 1;
    }

    fn get_plugin_factory(&mut self) -> PluginResult<Box<dyn PluginFactory + '_>> {
        Ok(Box::new(ManifestFactory::new(
            &self.registry,
            &self.manifest,
            self.verify_checksums,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::calculate_checksum;
    use blob_core::ErrorKind;
    use blob_embedded::EmbeddedStoreBuilder;

    const ID: &str = "6f1c2a5e-3b1d-4c7a-9f0e-2d4b8a6c1e3f";

    fn exporter() -> InterfaceId {
        InterfaceId::new("blobkit.Exporter")
    }

    fn registry() -> PluginRegistry {
        PluginRegistry::new()
            .with("demo::CsvExporter", [exporter()])
            .with("demo::Viewer", [InterfaceId::new("blobkit.Viewer")])
    }

    fn manifest_json(type_name: &str, interfaces: &[&str], checksums: &[(&str, String)]) -> String {
        serde_json::json!({
            "id": ID,
            "type_name": type_name,
            "interfaces": interfaces,
            "checksums": checksums.iter().cloned().collect::<BTreeMap<_, _>>(),
        })
        .to_string()
    }

    fn find(manifest: Option<String>, extra: &[(&str, &[u8])]) -> PluginResult<PluginInfo> {
        let mut builder = EmbeddedStoreBuilder::new("candidate");
        if let Some(manifest) = manifest {
            builder = builder.resource("plugin.json", manifest.into_bytes());
        }
        for (path, bytes) in extra {
            builder = builder.resource(path, bytes.to_vec());
        }
        let store = builder.build().unwrap();

        let registry = registry();
        let key = Key::new("plugin.json");
        let mut factory = ManifestFactory::new(&registry, &key, true);
        factory.find_plugin(&store, &exporter())
    }

    #[test]
    fn test_finds_registered_plugin() {
        let info = find(
            Some(manifest_json("demo::CsvExporter", &["blobkit.Exporter"], &[])),
            &[],
        )
        .unwrap();
        assert_eq!(info.id.to_string(), ID);
        assert_eq!(info.type_name, "demo::CsvExporter");
    }

    #[test]
    fn test_missing_manifest() {
        let err = find(None, &[("readme.txt", b"hi")]).unwrap_err();
        assert!(matches!(err, PluginError::ManifestMissing { .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_malformed_manifest() {
        let err = find(Some("{ not json".to_string()), &[]).unwrap_err();
        assert!(matches!(err, PluginError::MalformedManifest { .. }));
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_unknown_type() {
        let err = find(
            Some(manifest_json("demo::Mystery", &["blobkit.Exporter"], &[])),
            &[],
        )
        .unwrap_err();
        assert!(
            matches!(err, PluginError::UnknownType { ref type_name } if type_name == "demo::Mystery")
        );
    }

    #[test]
    fn test_interface_not_implemented() {
        // Declared by the manifest but not registered for the type.
        let err = find(
            Some(manifest_json("demo::Viewer", &["blobkit.Exporter"], &[])),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, PluginError::InterfaceNotImplemented { .. }));

        // Registered for the type but not declared by the manifest.
        let err = find(Some(manifest_json("demo::CsvExporter", &[], &[])), &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_checksums_are_verified() {
        let payload: &[u8] = b"\0asm payload";
        let good = manifest_json(
            "demo::CsvExporter",
            &["blobkit.Exporter"],
            &[("bin/exporter.wasm", calculate_checksum(payload))],
        );
        assert!(find(Some(good), &[("bin/exporter.wasm", payload)]).is_ok());

        let bad = manifest_json(
            "demo::CsvExporter",
            &["blobkit.Exporter"],
            &[("bin/exporter.wasm", calculate_checksum(b"something else"))],
        );
        let err = find(Some(bad), &[("bin/exporter.wasm", payload)]).unwrap_err();
        assert!(err.is_security_error());
    }

    #[test]
    fn test_invalid_checksum_paths_are_malformed() {
        for path in ["", "/", "..", "bin/../exporter.wasm", "./exporter.wasm"] {
            let manifest = manifest_json(
                "demo::CsvExporter",
                &["blobkit.Exporter"],
                &[(path, calculate_checksum(b""))],
            );
            let err = find(Some(manifest), &[]).unwrap_err();
            assert!(
                matches!(err, PluginError::InvalidChecksumPath { path: ref p, .. } if p == path),
                "{path:?}: {err:?}"
            );
            assert_eq!(err.kind(), ErrorKind::Malformed);
            assert!(!err.is_fatal());
        }
    }

    #[test]
    fn test_registry_host_counts_scopes() {
        let mut host = RegistryHost::new(registry());
        assert_eq!(host.registry().len(), 2);

        host.open_factory_scope().unwrap();
        assert!(host.open_factory_scope().is_err());
        host.close_factory_scope();
        assert_eq!((host.opened_scopes(), host.closed_scopes()), (1, 1));
    }

    #[test]
    fn test_registry_host_with_config() {
        let config = DiscoveryConfig {
            manifest_name: "component.json".to_string(),
            verify_checksums: false,
        };
        let host = RegistryHost::with_config(registry(), &config).unwrap();
        assert_eq!(host.manifest, Key::new("component.json"));
        assert!(!host.verify_checksums);

        let bad = DiscoveryConfig {
            manifest_name: String::new(),
            verify_checksums: true,
        };
        let err = RegistryHost::with_config(registry(), &bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
    }
}
