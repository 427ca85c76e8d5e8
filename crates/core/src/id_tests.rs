// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::task::TaskSource;
use std::borrow::Borrow;
use std::collections::HashMap;

// --- TaskId tests ---

#[test]
fn from_parts_joins_source_and_name() {
    let id = TaskId::from_parts(&TaskSource::Workspace, "build");
    assert_eq!(id.as_str(), "workspace|build");
}

#[test]
fn source_and_name_split_on_first_separator() {
    let id = TaskId::new("npm|watch|client");
    assert_eq!(id.source(), "npm");
    assert_eq!(id.name(), "watch|client");
}

#[test]
fn bare_name_has_empty_source_semantics() {
    let id = TaskId::new("build");
    assert_eq!(id.source(), "build");
    assert_eq!(id.name(), "build");
}

#[test]
fn is_workspace_checks_source_component() {
    assert!(TaskId::new("workspace|build").is_workspace());
    assert!(!TaskId::new("npm|build").is_workspace());
}

#[test]
fn display_matches_raw_form() {
    let id = TaskId::new("workspace|test");
    assert_eq!(id.to_string(), "workspace|test");
}

#[test]
fn hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(TaskId::new("workspace|lint"), 7);
    assert_eq!(map.get("workspace|lint"), Some(&7));
}

#[test]
fn borrow_str() {
    let id = TaskId::new("npm|build");
    let borrowed: &str = id.borrow();
    assert_eq!(borrowed, "npm|build");
}

#[test]
fn partial_eq_str() {
    let id = TaskId::new("workspace|deploy");
    assert_eq!(id, "workspace|deploy");
}

#[test]
fn serde_roundtrip_is_plain_string() {
    let id = TaskId::new("workspace|build");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"workspace|build\"");
    let back: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

// --- short() tests ---

#[yare::parameterized(
    truncates  = { "abcdefghijklmnop", 8, "abcdefgh" },
    full_short = { "abc", 8, "abc" },
    full_exact = { "abcdefgh", 8, "abcdefgh" },
)]
fn short_truncation(input: &str, n: usize, expected: &str) {
    assert_eq!(TaskId::new(input).short(n), expected);
    assert_eq!(input.short(n), expected);
}

// --- IdGen tests ---

#[test]
fn uuid_gen_creates_unique_ids() {
    let id_gen = UuidIdGen;
    let id1 = id_gen.next();
    let id2 = id_gen.next();
    assert_ne!(id1, id2);
    assert_eq!(id1.len(), 36); // UUID format
}

#[test]
fn sequential_gen_creates_predictable_ids() {
    let id_gen = SequentialIdGen::new("exec");
    assert_eq!(id_gen.next(), "exec-1");
    assert_eq!(id_gen.next(), "exec-2");
}

#[test]
fn sequential_gen_is_cloneable_and_shared() {
    let id_gen1 = SequentialIdGen::new("shared");
    let id_gen2 = id_gen1.clone();
    assert_eq!(id_gen1.next(), "shared-1");
    assert_eq!(id_gen2.next(), "shared-2");
}
