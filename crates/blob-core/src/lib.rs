//! Core types and the storage capability contract for blobkit.
//!
//! A blob store is a hierarchical, key-addressed storage abstraction over
//! elements (leaf byte streams) and child stores (folders). This crate
//! provides the pieces every backend shares:
//!
//! - Addressing: [`Key`] (one case-normalized segment) and [`KeyPath`]
//! - The [`BlobStore`] trait that every backend implements
//! - [`AccessMode`] flags and the [`ModeStream`] guard for stream opens
//! - [`NullStore`], the always-empty store returned for missing children
//! - The [`StoreError`] hierarchy and [`ErrorKind`] taxonomy
//! - TOML-backed [`StoreConfig`]
//!
//! # Examples
//!
//! ```
//! use blob_core::{BlobStore, Key, KeyPath, NullStore};
//!
//! let store = NullStore::new(KeyPath::parse("plugins/missing").unwrap());
//! assert!(!store.exists(&Key::new("plugin.json")).unwrap());
//! assert_eq!(store.enumerate().unwrap().count(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
mod error;
mod key;
mod mode;
mod null;
mod store;
mod stream;

pub use config::{ArchiveConfig, Compression, DiscoveryConfig, StoreConfig};
pub use error::{ConfigError, ErrorKind, Result, StoreError};
pub use key::{Key, KeyPath};
pub use mode::AccessMode;
pub use null::NullStore;
pub use store::{BlobStore, Elements};
pub use stream::{BlobStream, ModeStream};
