//! Read-only blob stores over compiled-in resources.
//!
//! Resources are addressed by dot-joined qualified names such as
//! `app.icons.logo.png`. An [`EmbeddedStore`] tree is built once, up front,
//! by [`EmbeddedStoreBuilder`] from the resource paths it is given; the
//! bytes themselves are looked up through a [`ResourceTable`] only when a
//! stream is opened.
//!
//! # Examples
//!
//! ```
//! use blob_core::{BlobStore, Key};
//! use blob_embedded::EmbeddedStoreBuilder;
//!
//! let store = EmbeddedStoreBuilder::new("app")
//!     .resource("icons/logo.svg", b"<svg/>".to_vec())
//!     .resource("readme.txt", b"hello".to_vec())
//!     .build()
//!     .unwrap();
//!
//! assert!(store.exists(&Key::new("readme.txt")).unwrap());
//! let icons = store.get_child_store(&Key::new("icons"), true).unwrap();
//! assert_eq!(icons.read_element(&Key::new("logo.svg")).unwrap(), b"<svg/>");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod builder;
mod resources;
mod store;

pub use builder::EmbeddedStoreBuilder;
pub use resources::{ResourceMap, ResourceTable, StaticResources, qualify};
pub use store::EmbeddedStore;
