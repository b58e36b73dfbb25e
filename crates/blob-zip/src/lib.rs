//! Zip-archive-backed blob stores.
//!
//! [`ArchiveStore`] opens a zip archive held in any [`ArchiveContainer`]
//! (a [`File`](std::fs::File) or an in-memory `Cursor<Vec<u8>>`) and
//! exposes its entries as a tree of [`SectionStore`]s. Folder structure is
//! reconstructed from the flat entry list at open; changes are staged in
//! memory and written back in one pass when the archive is closed.
//!
//! # Examples
//!
//! ```
//! use blob_core::{BlobStore, Key};
//! use blob_zip::ArchiveStore;
//! use std::io::Cursor;
//!
//! let archive = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
//! {
//!     let docs = archive.create_child_store(&Key::new("docs")).unwrap();
//!     docs.write_element(&Key::new("readme.md"), b"# hello").unwrap();
//! }
//! assert!(archive.has_child_store(&Key::new("docs")).unwrap());
//! assert_eq!(archive.entry_count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod archive;
mod container;
mod section;
mod writer;

pub use archive::{ArchiveStore, SectionStore};
pub use container::ArchiveContainer;
pub use section::EntryDescriptor;
