//! Contract tests for embedded-resource stores.

use blob_core::{AccessMode, BlobStore, ErrorKind, Key};
use blob_embedded::{EmbeddedStore, EmbeddedStoreBuilder, StaticResources};
use std::io::Read;

static RESOURCES: &[(&str, &[u8])] = &[
    ("demo.plugins.alpha.plugin.json", b"{}"),
    ("demo.plugins.beta.plugin.json", b"{}"),
    ("demo.license.txt", b"MIT"),
];

fn store() -> EmbeddedStore {
    EmbeddedStoreBuilder::with_table("demo", StaticResources::new(RESOURCES))
        .declare("plugins/alpha/plugin.json")
        .declare("plugins/beta/plugin.json")
        .declare("license.txt")
        .declare("missing.txt")
        .build()
        .unwrap()
}

#[test]
fn test_erase_is_always_unsupported() {
    let store = store();
    for name in ["license.txt", "missing.txt", "never-heard-of-it"] {
        let err = store.erase(&Key::new(name)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}

#[test]
fn test_write_opens_are_always_unsupported() {
    let store = store();
    let plugins = store.get_child_store(&Key::new("plugins"), false).unwrap();
    for target in [&store as &dyn BlobStore, &*plugins] {
        for mode in [AccessMode::WRITE, AccessMode::APPEND] {
            let err = target.open_stream(&Key::new("license.txt"), mode).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unsupported);
        }
    }
}

#[test]
fn test_unknown_read_is_zero_length() {
    let store = store();
    for name in ["missing.txt", "not-declared.bin"] {
        let mut stream = store.open_stream(&Key::new(name), AccessMode::READ).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }
}

#[test]
fn test_nested_namespaces() {
    let store = store();
    assert_eq!(
        store.get_child_store_keys().unwrap().into_iter().collect::<Vec<_>>(),
        vec![Key::new("plugins")]
    );

    let plugins = store.get_child_store(&Key::new("plugins"), true).unwrap();
    let keys = plugins.get_child_store_keys().unwrap();
    assert!(keys.contains(&Key::new("alpha")));
    assert!(keys.contains(&Key::new("beta")));

    let alpha = plugins.get_child_store(&Key::new("ALPHA"), true).unwrap();
    assert_eq!(alpha.identifier().to_string(), "plugins/alpha");
    assert_eq!(alpha.read_element(&Key::new("plugin.json")).unwrap(), b"{}");
}

#[test]
fn test_unknown_child_never_fails() {
    let store = store();
    let ghost = store.get_child_store(&Key::new("ghost"), false).unwrap();
    let deeper = ghost.get_child_store(&Key::new("deeper"), true).unwrap();
    assert_eq!(deeper.enumerate().unwrap().count(), 0);
    assert!(!deeper.has_child_store(&Key::new("x")).unwrap());
}
