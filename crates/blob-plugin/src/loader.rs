//! Plugin discovery over the direct children of a root store.

use crate::error::{PluginError, PluginResult};
use crate::factory::{FactoryHost, FactoryScope};
use crate::logger::Logger;
use crate::types::{InterfaceId, PluginId, PluginInfo};
use blob_core::{BlobStore, Key};
use std::collections::{BTreeMap, btree_set};
use std::fmt;
use tracing::info;

/// Outcome of inspecting one candidate store.
#[derive(Debug)]
pub struct Candidate {
    /// Key of the candidate under the root store
    pub key: Key,
    /// What the factory reported for it
    pub outcome: PluginResult<PluginInfo>,
}

/// Scans candidate stores and asks a factory about each one.
///
/// Every direct child of the root is a candidate. Each inspection runs in
/// its own factory scope, and at most one scope is open at any time. The
/// root is navigated read-only.
///
/// # Examples
///
/// ```
/// use blob_embedded::EmbeddedStoreBuilder;
/// use blob_plugin::{InterfaceId, PluginLoader, PluginRegistry, RegistryHost, TracingLogger};
///
/// let manifest = r#"{
///     "id": "6f1c2a5e-3b1d-4c7a-9f0e-2d4b8a6c1e3f",
///     "type_name": "demo::CsvExporter",
///     "interfaces": ["blobkit.Exporter"]
/// }"#;
/// let root = EmbeddedStoreBuilder::new("plugins")
///     .resource("csv/plugin.json", manifest)
///     .resource("broken/readme.txt", "no manifest here")
///     .build()
///     .unwrap();
///
/// let exporter = InterfaceId::new("blobkit.Exporter");
/// let registry = PluginRegistry::new().with("demo::CsvExporter", [exporter.clone()]);
/// let mut loader = PluginLoader::new(&root, RegistryHost::new(registry));
///
/// let found = loader.discover(&exporter, Some(&TracingLogger)).unwrap();
/// assert_eq!(found.len(), 1);
/// assert_eq!(loader.host().opened_scopes(), 2);
/// ```
pub struct PluginLoader<'s, H: FactoryHost> {
    root: &'s dyn BlobStore,
    host: H,
}

impl<'s, H: FactoryHost> PluginLoader<'s, H> {
    /// Creates a loader over the candidates below `root`.
    pub fn new(root: &'s dyn BlobStore, host: H) -> Self {
        Self { root, host }
    }

    /// The factory host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The factory host, mutably.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the loader and returns the factory host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Starts a lazy scan over every candidate.
    ///
    /// Candidates are inspected one per call to [`Iterator::next`]; dropping
    /// the scan stops it between candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if the root's children cannot be listed.
    pub fn scan<'a>(&'a mut self, interface: &'a InterfaceId) -> PluginResult<Scan<'a, 's, H>> {
        let keys = self.root.get_child_store_keys()?;
        Ok(Scan {
            loader: self,
            interface,
            keys: keys.into_iter(),
        })
    }

    /// Inspects every candidate and collects the plugins found.
    ///
    /// Failed candidates are logged as warnings and skipped. When two
    /// candidates report the same id, the later one wins. If the root's
    /// children cannot be listed the failure is logged and the mapping is
    /// empty.
    ///
    /// # Errors
    ///
    /// Only fatal errors (a disposed store, a contract violation) abort the
    /// scan.
    pub fn discover(
        &mut self,
        interface: &InterfaceId,
        logger: Option<&dyn Logger>,
    ) -> PluginResult<BTreeMap<PluginId, PluginInfo>> {
        let mut found = BTreeMap::new();

        let scan = match self.scan(interface) {
            Ok(scan) => scan,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                if let Some(logger) = logger {
                    logger.error(format_args!("Cannot list plugin candidates: {e}"));
                }
                return Ok(found);
            }
        };

        let mut failed = 0usize;
        for Candidate { key, outcome } in scan {
            match outcome {
                Ok(plugin) => {
                    if let Some(logger) = logger {
                        logger.debug(format_args!(
                            "Found {} ({}) in {key}",
                            plugin.type_name, plugin.id
                        ));
                    }
                    found.insert(plugin.id, plugin);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    failed += 1;
                    if let Some(logger) = logger {
                        logger.warning(format_args!("Skipping plugin candidate {key}: {e}"));
                    }
                }
            }
        }

        info!(
            "Discovered {} plugins for {} ({} candidates skipped)",
            found.len(),
            interface,
            failed
        );
        Ok(found)
    }

    /// Inspects the single candidate named `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::StoreNotFound`] without opening a factory scope
    /// if the root has no child named `key`, and the factory's error
    /// otherwise.
    pub fn load(
        &mut self,
        key: &Key,
        interface: &InterfaceId,
        logger: Option<&dyn Logger>,
    ) -> PluginResult<PluginInfo> {
        if !self.root.has_child_store(key)? {
            let err = PluginError::StoreNotFound {
                key: key.to_string(),
                store: self.root.identifier().to_string(),
            };
            if let Some(logger) = logger {
                logger.warning(format_args!("{err}"));
            }
            return Err(err);
        }

        let outcome = self.inspect(key, interface);
        if let Some(logger) = logger {
            match &outcome {
                Ok(plugin) => logger.debug(format_args!(
                    "Loaded {} ({}) from {key}",
                    plugin.type_name, plugin.id
                )),
                Err(e) => logger.warning(format_args!("Cannot load plugin {key}: {e}")),
            }
        }
        outcome
    }

    /// Runs one factory session against the child named `key`.
    fn inspect(&mut self, key: &Key, interface: &InterfaceId) -> PluginResult<PluginInfo> {
        let root = self.root;
        let candidate = root.get_child_store(key, true)?;
        let mut scope = FactoryScope::open(&mut self.host)?;
        let mut factory = scope.factory()?;
        factory.find_plugin(&*candidate, interface)
    }
}

impl<H: FactoryHost + fmt::Debug> fmt::Debug for PluginLoader<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginLoader")
            .field("root", &self.root.identifier())
            .field("host", &self.host)
            .finish()
    }
}

/// Lazy scan returned by [`PluginLoader::scan`].
pub struct Scan<'a, 's, H: FactoryHost> {
    loader: &'a mut PluginLoader<'s, H>,
    interface: &'a InterfaceId,
    keys: btree_set::IntoIter<Key>,
}

impl<H: FactoryHost> Iterator for Scan<'_, '_, H> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let key = self.keys.next()?;
        let outcome = self.loader.inspect(&key, self.interface);
        Some(Candidate { key, outcome })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<H: FactoryHost> fmt::Debug for Scan<'_, '_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scan")
            .field("interface", self.interface)
            .field("remaining", &self.keys.len())
            .finish_non_exhaustive()
    }
}
