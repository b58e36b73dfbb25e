//! Plugin discovery over blobkit store hierarchies.
//!
//! A [`PluginLoader`] treats every direct child of a root store as a
//! candidate plugin. For each candidate it opens an isolated factory session
//! through a [`FactoryHost`], asks the session's [`PluginFactory`] whether
//! the candidate implements the requested interface, and closes the session
//! again before moving on. Failures on one candidate are logged and skipped.
//!
//! # Layout
//!
//! The bundled [`RegistryHost`] reads a JSON manifest from each candidate:
//!
//! ```text
//! plugins/
//! ├── csv-export/
//! │   ├── plugin.json       # id, type name, interfaces, checksums
//! │   └── bin/
//! │       └── exporter.dat
//! └── xml-export/
//!     └── plugin.json
//! ```
//!
//! Manifest checksums are Blake3 digests in the `blake3:<hex>` format (see
//! [`checksum`]) and are verified before a candidate is accepted.
//!
//! # Examples
//!
//! ```
//! use blob_core::Key;
//! use blob_embedded::EmbeddedStoreBuilder;
//! use blob_plugin::{InterfaceId, PluginLoader, PluginRegistry, RegistryHost};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = EmbeddedStoreBuilder::new("plugins")
//!     .resource(
//!         "xml/plugin.json",
//!         r#"{"id": "0b5c9d3e-8f21-4a6b-b7c4-5d2e1f0a9b8c", "type_name": "demo::Xml", "interfaces": ["demo.Api"]}"#,
//!     )
//!     .build()?;
//!
//! let api = InterfaceId::new("demo.Api");
//! let registry = PluginRegistry::new().with("demo::Xml", [api.clone()]);
//! let mut loader = PluginLoader::new(&root, RegistryHost::new(registry));
//!
//! let plugin = loader.load(&Key::new("xml"), &api, None)?;
//! assert_eq!(plugin.type_name, "demo::Xml");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod checksum;
mod error;
mod factory;
mod loader;
mod logger;
mod registry;
mod types;

pub use error::{PluginError, PluginResult};
pub use factory::{FactoryHost, FactoryScope, PluginFactory};
pub use loader::{Candidate, PluginLoader, Scan};
pub use logger::{Logger, TracingLogger};
pub use registry::{ManifestFactory, PluginManifest, PluginRegistry, RegistryHost};
pub use types::{InterfaceId, PluginId, PluginInfo};
