// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name-to-task resolution
//!
//! The host's enumeration order is unspecified, so every resolution path
//! funnels through [`find_by_name`] and its single source-precedence
//! rule: a workspace-defined task always beats same-named tasks from
//! other sources. Without this, dependency registration and execution
//! can pick different variants of the same name and the hierarchy never
//! matches what actually runs.

use ob_core::{HostTask, TaskId, TaskSource, ID_SEPARATOR};

/// Exact `source|name` lookup.
pub fn find_by_id<'a>(tasks: &'a [HostTask], id: &TaskId) -> Option<&'a HostTask> {
    tasks.iter().find(|t| t.id() == *id)
}

/// Name lookup with source precedence: workspace first, else first match.
pub fn find_by_name<'a>(tasks: &'a [HostTask], name: &str) -> Option<&'a HostTask> {
    let mut first = None;
    for task in tasks {
        if task.name == name {
            if task.source == TaskSource::Workspace {
                return Some(task);
            }
            first.get_or_insert(task);
        }
    }
    first
}

/// Resolve a user-supplied string to a task.
///
/// Order: exact ID, then name with source precedence, then the legacy
/// `npm: X` prefix form.
pub fn resolve<'a>(tasks: &'a [HostTask], arg: &str) -> Option<&'a HostTask> {
    if arg.contains(ID_SEPARATOR) {
        if let Some(task) = find_by_id(tasks, &TaskId::new(arg)) {
            return Some(task);
        }
    }

    if let Some(task) = find_by_name(tasks, arg) {
        return Some(task);
    }

    if let Some(script) = arg.strip_prefix("npm: ") {
        return tasks
            .iter()
            .find(|t| t.source == TaskSource::Npm && t.name == script);
    }

    None
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
