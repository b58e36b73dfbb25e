//! Directory-tree backend for blobkit.
//!
//! [`DirectoryStore`] maps a real directory onto the [`BlobStore`] contract:
//! regular files are elements, subdirectories are child stores.
//!
//! # Examples
//!
//! ```
//! use blob_core::{BlobStore, Key};
//! use blob_fs::DirectoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let store = DirectoryStore::open(temp.path(), false)?;
//!
//! store.write_element(&Key::new("notes.txt"), b"hello")?;
//! assert!(store.exists(&Key::new("NOTES.txt"))?);
//! assert_eq!(store.read_element(&Key::new("notes.txt"))?, b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! [`BlobStore`]: blob_core::BlobStore

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod store;

pub use store::DirectoryStore;
