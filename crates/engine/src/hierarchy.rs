// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory parent→children dependency hierarchy
//!
//! Invariants: a child has at most one direct parent at any instant, and
//! every walk (ascent or descent) carries a visited set. A revisit is a
//! terminator, not an error, so cyclic dependency declarations cannot
//! hang the engine.

use crate::deps::DepsReader;
use crate::resolver;
use ob_adapters::{ActiveExecution, ExecutionHandle};
use ob_core::{HostTask, TaskId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Parent → direct children map.
#[derive(Default)]
pub struct Hierarchy {
    children: Mutex<HashMap<TaskId, Vec<TaskId>>>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent edge insertion.
    ///
    /// A child keeps its first parent: an insert under a second parent
    /// is dropped so ascent stays single-valued.
    pub fn add_child(&self, parent: &TaskId, child: &TaskId) {
        if parent == child {
            return;
        }
        let mut map = self.children.lock();
        if let Some(existing) = find_parent_in(&map, child) {
            if existing != *parent {
                tracing::debug!(
                    child = %child,
                    existing = %existing,
                    rejected = %parent,
                    "child already has a parent, keeping first edge"
                );
                return;
            }
        }
        let entry = map.entry(parent.clone()).or_default();
        if !entry.contains(child) {
            entry.push(child.clone());
        }
    }

    /// Remove one edge; an emptied parent entry is deleted.
    pub fn remove_child(&self, parent: &TaskId, child: &TaskId) {
        let mut map = self.children.lock();
        if let Some(entry) = map.get_mut(parent) {
            entry.retain(|c| c != child);
            if entry.is_empty() {
                map.remove(parent);
            }
        }
    }

    /// Delete a parent's entry entirely.
    pub fn remove_parent_key(&self, parent: &TaskId) {
        self.children.lock().remove(parent);
    }

    /// Snapshot of a parent's direct children.
    pub fn children(&self, parent: &TaskId) -> Vec<TaskId> {
        self.children
            .lock()
            .get(parent)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether any parent entry exists (test hook).
    pub fn is_empty(&self) -> bool {
        self.children.lock().is_empty()
    }

    /// All current parent keys (test hook).
    pub fn parent_keys(&self) -> Vec<TaskId> {
        self.children.lock().keys().cloned().collect()
    }

    /// Direct parent of a child, if any. Linear scan; the map is small.
    pub fn find_parent(&self, child: &TaskId) -> Option<TaskId> {
        find_parent_in(&self.children.lock(), child)
    }

    /// Direct parent with label fallback: when no exact edge exists, a
    /// registered child with the same name but different source counts.
    pub fn find_parent_like(&self, child: &TaskId) -> Option<TaskId> {
        let map = self.children.lock();
        if let Some(parent) = find_parent_in(&map, child) {
            return Some(parent);
        }
        for (parent, children) in map.iter() {
            if children.iter().any(|c| c.name() == child.name()) {
                return Some(parent.clone());
            }
        }
        None
    }

    /// All parents listing this child (degenerate trees may have several).
    pub fn parents_of(&self, child: &TaskId) -> Vec<TaskId> {
        self.children
            .lock()
            .iter()
            .filter(|(_, children)| children.contains(child))
            .map(|(parent, _)| parent.clone())
            .collect()
    }

    /// Iterative ascent: `[parent, grandparent, …, topmost]`.
    ///
    /// Stops when the next step revisits a seen node.
    pub fn ancestors(&self, id: &TaskId) -> Vec<TaskId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(id.clone());
        let mut current = id.clone();
        while let Some(parent) = self.find_parent(&current) {
            if !visited.insert(parent.clone()) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }

    /// The top-most ancestor, or the id itself when it has no parent.
    pub fn topmost(&self, id: &TaskId) -> TaskId {
        self.ancestors(id).last().cloned().unwrap_or_else(|| id.clone())
    }

    /// Depth-first enumeration of every descendant.
    pub fn all_descendants(&self, id: &TaskId) -> Vec<TaskId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(id.clone());
        let mut stack = self.children(id);
        while let Some(next) = stack.pop() {
            if !visited.insert(next.clone()) {
                continue;
            }
            stack.extend(self.children(&next));
            result.push(next);
        }
        result
    }

    /// Register `id`'s declared dependency tree, recursively.
    pub fn register_dependency_tree(
        &self,
        id: &TaskId,
        all_tasks: &[HostTask],
        reader: &DepsReader,
        visited: &mut HashSet<TaskId>,
    ) {
        if !visited.insert(id.clone()) {
            return;
        }
        let Some(task) = resolver::find_by_id(all_tasks, id) else {
            return;
        };
        for dep_name in reader.read(task).deps {
            let Some(dep_task) = resolver::find_by_name(all_tasks, &dep_name) else {
                tracing::debug!(task = %id, dep = %dep_name, "dependency does not resolve to a task");
                continue;
            };
            let dep_id = dep_task.id();
            self.add_child(id, &dep_id);
            self.register_dependency_tree(&dep_id, all_tasks, reader, visited);
        }
    }

    /// Discover parents for a task that started without a registered one.
    ///
    /// Scans the host's active executions for any whose dependency list
    /// names this task. Matching falls back to label-only when the
    /// registered and actual sources disagree; either way the edge is
    /// registered under the *actual* started ID so later lookups are
    /// direct. Recurses so the grand-chain is registered too. Returns
    /// `(parent, handle)` pairs so the caller can store handles for stop.
    pub fn discover_parents(
        &self,
        id: &TaskId,
        active: &[ActiveExecution],
        all_tasks: &[HostTask],
        reader: &DepsReader,
    ) -> Vec<(TaskId, Arc<dyn ExecutionHandle>)> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        self.discover_parents_inner(id, active, all_tasks, reader, &mut visited, &mut found);
        found
    }

    fn discover_parents_inner(
        &self,
        id: &TaskId,
        active: &[ActiveExecution],
        all_tasks: &[HostTask],
        reader: &DepsReader,
        visited: &mut HashSet<TaskId>,
        found: &mut Vec<(TaskId, Arc<dyn ExecutionHandle>)>,
    ) {
        if !visited.insert(id.clone()) {
            return;
        }
        for execution in active {
            let parent_id = execution.task.id();
            if parent_id == *id {
                continue;
            }
            let lists_child = reader.read(&execution.task).deps.iter().any(|dep_name| {
                let registered = resolver::find_by_name(all_tasks, dep_name).map(|t| t.id());
                match registered {
                    Some(registered_id) if registered_id == *id => true,
                    // Source mismatch between registered and actual: label match
                    _ => dep_name == id.name(),
                }
            });
            if !lists_child {
                continue;
            }
            self.add_child(&parent_id, id);
            found.push((parent_id.clone(), Arc::clone(&execution.handle)));
            self.discover_parents_inner(&parent_id, active, all_tasks, reader, visited, found);
        }
    }
}

fn find_parent_in(map: &HashMap<TaskId, Vec<TaskId>>, child: &TaskId) -> Option<TaskId> {
    map.iter()
        .find(|(_, children)| children.contains(child))
        .map(|(parent, _)| parent.clone())
}

#[cfg(test)]
#[path = "hierarchy_tests.rs"]
mod tests;
