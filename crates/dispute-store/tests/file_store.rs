//! Integration tests for the file-backed record store.

use dispute_store::{FileStore, RecordStore, StoreError};
use serde_json::json;

#[test]
fn missing_collection_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    assert!(store.load("commission-disputes").unwrap().is_none());
}

#[test]
fn save_then_load_round_trips_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let doc = json!({"schemaVersion": 1, "records": [{"id": "a"}]});
    store.save("commission-disputes", &doc).unwrap();
    assert!(store.path_for("commission-disputes").exists());
    assert_eq!(store.load("commission-disputes").unwrap(), Some(doc));
}

#[test]
fn second_handle_sees_saved_document() {
    let dir = tempfile::tempdir().unwrap();
    let writer = FileStore::open(dir.path()).unwrap();
    let reader = FileStore::open(dir.path()).unwrap();
    writer.save("k", &json!([1])).unwrap();
    writer.save("k", &json!([1, 2])).unwrap();
    assert_eq!(reader.load("k").unwrap(), Some(json!([1, 2])));
}

#[test]
fn save_leaves_no_temporary_files_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.save("k", &json!({})).unwrap();
    store.save("k", &json!({"again": true})).unwrap();
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn corrupt_file_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    std::fs::write(store.path_for("k"), b"{not json").unwrap();
    assert!(matches!(
        store.load("k"),
        Err(StoreError::Serialization { .. })
    ));
}

#[test]
fn open_creates_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileStore::open(&nested).unwrap();
    assert!(store.root().is_dir());
}

#[test]
fn path_traversal_key_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    assert!(matches!(
        store.save("../escape", &json!(null)),
        Err(StoreError::InvalidKey(_))
    ));
}
