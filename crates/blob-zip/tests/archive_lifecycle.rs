//! End-to-end tests for archive open, mutation, close and reopen.

use blob_core::{AccessMode, BlobStore, ErrorKind, Key};
use blob_zip::ArchiveStore;
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn archive_with(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    let mut cursor = writer.finish().unwrap();
    cursor.set_position(0);
    cursor
}

#[test]
fn test_nested_entry_reconstructs_folders() {
    let store = ArchiveStore::open_read_only(archive_with(&[("a/b/c.txt", b"content")])).unwrap();

    assert!(store.has_child_store(&Key::new("a")).unwrap());
    let a = store.get_child_store(&Key::new("a"), true).unwrap();
    assert!(a.has_child_store(&Key::new("b")).unwrap());
    let b = a.get_child_store(&Key::new("b"), true).unwrap();

    assert!(b.exists(&Key::new("c.txt")).unwrap());
    assert!(!store.exists(&Key::new("c.txt")).unwrap());
    assert_eq!(b.identifier().to_string(), "a/b");
}

#[test]
fn test_unknown_child_never_fails() {
    let store = ArchiveStore::open_read_only(archive_with(&[("a/x.txt", b"")])).unwrap();

    for name in ["missing", "A", "x.txt"] {
        let child = store.get_child_store(&Key::new(name), false).unwrap();
        let deeper = child.get_child_store(&Key::new("deeper"), false).unwrap();
        assert!(!deeper.has_child_store(&Key::new("anything")).unwrap());
        assert_eq!(deeper.enumerate().unwrap().count(), 0);
    }
}

#[test]
fn test_empty_container_write_close_reopen() {
    let mut store = ArchiveStore::open(Cursor::new(Vec::new())).unwrap();
    store.write_element(&Key::new("x"), b"").unwrap();
    store.close().unwrap();

    let mut container = store.into_inner().unwrap();
    container.set_position(0);

    let reopened = ArchiveStore::open(container).unwrap();
    assert!(reopened.exists(&Key::new("x")).unwrap());
}

#[test]
fn test_empty_file_write_drop_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fresh.zip");
    std::fs::File::create(&path).unwrap();

    {
        let store = ArchiveStore::open_path(&path, false).unwrap();
        let mut stream = store.open_stream(&Key::new("x"), AccessMode::WRITE).unwrap();
        stream.write_all(b"hello").unwrap();
    }

    let reopened = ArchiveStore::open_path(&path, true).unwrap();
    assert!(reopened.exists(&Key::new("X")).unwrap());
    assert_eq!(reopened.read_element(&Key::new("x")).unwrap(), b"hello");
}

#[test]
fn test_enumerate_is_fresh_per_call() {
    let store = ArchiveStore::open(archive_with(&[("one", b"1"), ("two", b"2")])).unwrap();

    let before: Vec<Key> = store.enumerate().unwrap().collect();
    store.write_element(&Key::new("three"), b"3").unwrap();
    let after: Vec<Key> = store.enumerate().unwrap().collect();

    assert_eq!(before.len(), 2);
    assert_eq!(after.len(), 3);
}

#[test]
fn test_use_after_close_is_fatal() {
    let mut store = ArchiveStore::open(archive_with(&[("a.txt", b"1")])).unwrap();
    store.close().unwrap();

    let err = store.has_child_store(&Key::new("a")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Disposed);
    assert!(err.is_fatal());
}
