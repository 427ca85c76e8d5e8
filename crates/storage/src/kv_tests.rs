// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn memory_store_roundtrip() {
    let store = MemoryKvStore::new();
    store.put("a", json!({"x": 1})).await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), Some(json!({"x": 1})));
    store.remove("a").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), None);
}

#[tokio::test]
async fn file_store_roundtrip() {
    let dir = tempdir().unwrap();
    let store = FileKvStore::new(dir.path().join("global.json"));
    store.put("taskHistory", json!({"t": []})).await.unwrap();
    store.put("other", json!(5)).await.unwrap();
    assert_eq!(
        store.get("taskHistory").await.unwrap(),
        Some(json!({"t": []}))
    );
    assert_eq!(store.get("other").await.unwrap(), Some(json!(5)));
}

#[tokio::test]
async fn file_store_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let store = FileKvStore::new(dir.path().join("absent.json"));
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn file_store_preserves_unknown_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"{"futureKey": {"nested": true}}"#).unwrap();
    let store = FileKvStore::new(&path);
    store.put("known", json!(1)).await.unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["futureKey"]["nested"], true);
    assert_eq!(value["known"], 1);
}

#[tokio::test]
async fn file_store_corrupt_file_rotates_to_bak() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "not json {{{").unwrap();
    let store = FileKvStore::new(&path);
    assert_eq!(store.get("k").await.unwrap(), None);
    assert!(dir.path().join("store.bak").exists());
}

#[tokio::test]
async fn file_store_remove_absent_is_noop() {
    let dir = tempdir().unwrap();
    let store = FileKvStore::new(dir.path().join("store.json"));
    store.remove("nothing").await.unwrap();
    assert!(!dir.path().join("store.json").exists());
}
