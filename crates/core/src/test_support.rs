// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders shared by other crates' tests
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::task::{DependsOrder, HostTask, TaskDependencies, TaskSource};

/// Workspace task with no declared dependencies.
pub fn workspace_task(name: &str) -> HostTask {
    HostTask::new(TaskSource::Workspace, name)
}

/// Npm package-script task with no declared dependencies.
pub fn npm_task(name: &str) -> HostTask {
    HostTask::new(TaskSource::Npm, name)
}

/// Workspace task declaring the given dependencies in parallel order.
pub fn task_with_deps(name: &str, deps: &[&str]) -> HostTask {
    let mut task = workspace_task(name);
    task.depends_on = Some(TaskDependencies {
        deps: deps.iter().map(|d| d.to_string()).collect(),
        order: DependsOrder::Parallel,
    });
    task
}

/// Workspace task declaring the given dependencies in sequence order.
pub fn task_with_sequence_deps(name: &str, deps: &[&str]) -> HostTask {
    let mut task = task_with_deps(name, deps);
    if let Some(depends_on) = task.depends_on.as_mut() {
        depends_on.order = DependsOrder::Sequence;
    }
    task
}
