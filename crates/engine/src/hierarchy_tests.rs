// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::deps::DepsReader;
use ob_adapters::{FakeTaskHost, TaskHost};
use ob_core::test_support::{task_with_deps, workspace_task};
use tempfile::tempdir;

fn id(name: &str) -> TaskId {
    TaskId::new(format!("workspace|{name}"))
}

fn reader() -> DepsReader {
    DepsReader::new(tempdir().unwrap().keep())
}

// --- edges ---

#[test]
fn add_child_is_idempotent() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("p"), &id("c"));
    hierarchy.add_child(&id("p"), &id("c"));
    assert_eq!(hierarchy.children(&id("p")), vec![id("c")]);
}

#[test]
fn add_child_ignores_self_edges() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("p"), &id("p"));
    assert!(hierarchy.is_empty());
}

#[test]
fn child_keeps_first_parent() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("p1"), &id("c"));
    hierarchy.add_child(&id("p2"), &id("c"));
    assert_eq!(hierarchy.find_parent(&id("c")), Some(id("p1")));
    assert!(hierarchy.children(&id("p2")).is_empty());
}

#[test]
fn remove_last_child_deletes_parent_entry() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("p"), &id("c"));
    hierarchy.remove_child(&id("p"), &id("c"));
    assert!(hierarchy.is_empty());
}

#[test]
fn remove_child_keeps_siblings() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("p"), &id("a"));
    hierarchy.add_child(&id("p"), &id("b"));
    hierarchy.remove_child(&id("p"), &id("a"));
    assert_eq!(hierarchy.children(&id("p")), vec![id("b")]);
}

// --- lookups ---

#[test]
fn find_parent_like_falls_back_to_label() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("p"), &TaskId::new("npm|c"));
    // Exact lookup with a different source misses, label fallback hits
    assert_eq!(hierarchy.find_parent(&id("c")), None);
    assert_eq!(hierarchy.find_parent_like(&id("c")), Some(id("p")));
}

#[test]
fn ancestors_walks_to_topmost() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("root"), &id("mid"));
    hierarchy.add_child(&id("mid"), &id("leaf"));
    assert_eq!(hierarchy.ancestors(&id("leaf")), vec![id("mid"), id("root")]);
    assert_eq!(hierarchy.topmost(&id("leaf")), id("root"));
    assert_eq!(hierarchy.topmost(&id("root")), id("root"));
}

#[test]
fn ancestors_terminates_on_cycle() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("a"), &id("b"));
    hierarchy.add_child(&id("b"), &id("a"));
    let chain = hierarchy.ancestors(&id("a"));
    assert_eq!(chain, vec![id("b")]);
}

#[test]
fn all_descendants_is_transitive_and_cycle_safe() {
    let hierarchy = Hierarchy::new();
    hierarchy.add_child(&id("r"), &id("a"));
    hierarchy.add_child(&id("r"), &id("b"));
    hierarchy.add_child(&id("a"), &id("x"));
    let mut descendants = hierarchy.all_descendants(&id("r"));
    descendants.sort();
    assert_eq!(descendants, vec![id("a"), id("b"), id("x")]);
}

// --- registration ---

#[test]
fn register_dependency_tree_resolves_and_recurses() {
    let hierarchy = Hierarchy::new();
    let tasks = vec![
        task_with_deps("build", &["compile"]),
        task_with_deps("compile", &["codegen"]),
        workspace_task("codegen"),
    ];
    hierarchy.register_dependency_tree(
        &id("build"),
        &tasks,
        &reader(),
        &mut HashSet::new(),
    );
    assert_eq!(hierarchy.children(&id("build")), vec![id("compile")]);
    assert_eq!(hierarchy.children(&id("compile")), vec![id("codegen")]);
}

#[test]
fn register_dependency_tree_survives_cycles() {
    let hierarchy = Hierarchy::new();
    let tasks = vec![
        task_with_deps("a", &["b"]),
        task_with_deps("b", &["a"]),
    ];
    // Terminates despite a ↔ b; both edges land, walks stay guarded
    hierarchy.register_dependency_tree(&id("a"), &tasks, &reader(), &mut HashSet::new());
    assert_eq!(hierarchy.children(&id("a")), vec![id("b")]);
    assert_eq!(hierarchy.children(&id("b")), vec![id("a")]);
    assert_eq!(hierarchy.ancestors(&id("a")), vec![id("b")]);
}

#[test]
fn register_skips_unresolvable_deps() {
    let hierarchy = Hierarchy::new();
    let tasks = vec![task_with_deps("build", &["ghost"])];
    hierarchy.register_dependency_tree(&id("build"), &tasks, &reader(), &mut HashSet::new());
    assert!(hierarchy.is_empty());
}

// --- discovery ---

#[tokio::test]
async fn discover_parents_scans_active_executions() {
    let hierarchy = Hierarchy::new();
    let host = FakeTaskHost::new();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    let tasks = vec![parent.clone(), child.clone()];
    host.add_active(parent.clone());

    let active = host.active_executions().await;
    let found = hierarchy.discover_parents(&child.id(), &active, &tasks, &reader());

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, parent.id());
    assert_eq!(hierarchy.find_parent(&child.id()), Some(parent.id()));
}

#[tokio::test]
async fn discover_parents_matches_by_label_on_source_mismatch() {
    let hierarchy = Hierarchy::new();
    let host = FakeTaskHost::new();
    // Parent declares "watch"; the registered variant resolves to the
    // workspace task, but the actually-started task came from npm.
    let parent = task_with_deps("parent", &["watch"]);
    let registered = workspace_task("watch");
    let actual = ob_core::test_support::npm_task("watch");
    let tasks = vec![parent.clone(), registered];
    host.add_active(parent.clone());

    let active = host.active_executions().await;
    let found = hierarchy.discover_parents(&actual.id(), &active, &tasks, &reader());

    assert_eq!(found.len(), 1);
    // The actual ID is registered, so the next lookup is direct
    assert_eq!(hierarchy.find_parent(&actual.id()), Some(parent.id()));
}

#[tokio::test]
async fn discover_parents_registers_grand_chain() {
    let hierarchy = Hierarchy::new();
    let host = FakeTaskHost::new();
    let grandparent = task_with_deps("gp", &["parent"]);
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    let tasks = vec![grandparent.clone(), parent.clone(), child.clone()];
    host.add_active(grandparent.clone());
    host.add_active(parent.clone());

    let active = host.active_executions().await;
    let found = hierarchy.discover_parents(&child.id(), &active, &tasks, &reader());

    let parents: Vec<_> = found.iter().map(|(p, _)| p.clone()).collect();
    assert!(parents.contains(&parent.id()));
    assert!(parents.contains(&grandparent.id()));
    assert_eq!(hierarchy.find_parent(&child.id()), Some(parent.id()));
    assert_eq!(hierarchy.find_parent(&parent.id()), Some(grandparent.id()));
}

#[tokio::test]
async fn discover_parents_ignores_unrelated_executions() {
    let hierarchy = Hierarchy::new();
    let host = FakeTaskHost::new();
    let other = task_with_deps("other", &["something-else"]);
    let child = workspace_task("child");
    let tasks = vec![other.clone(), child.clone()];
    host.add_active(other);

    let active = host.active_executions().await;
    let found = hierarchy.discover_parents(&child.id(), &active, &tasks, &reader());
    assert!(found.is_empty());
    assert!(hierarchy.is_empty());
}
