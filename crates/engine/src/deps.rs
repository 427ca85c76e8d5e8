// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency reader
//!
//! Produces a task's ordered dependency names and order tag. Sources, in
//! order: the task's own metadata, then the workspace config file. Parse
//! failures degrade to no dependencies; a broken config must never take
//! the orchestrator down with it.

use ob_core::{HostTask, TaskDependencies, WorkspaceTasksFile, WORKSPACE_TASKS_FILE};
use std::path::PathBuf;

/// Reads dependency declarations for host tasks.
#[derive(Clone)]
pub struct DepsReader {
    workspace_root: PathBuf,
}

impl DepsReader {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    /// Dependencies for a task: metadata first, config file second.
    pub fn read(&self, task: &HostTask) -> TaskDependencies {
        if let Some(deps) = &task.depends_on {
            return deps.clone();
        }
        self.read_from_config(&task.name)
    }

    fn read_from_config(&self, label: &str) -> TaskDependencies {
        let path = self.workspace_root.join(WORKSPACE_TASKS_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return TaskDependencies::default(),
        };

        let file = match WorkspaceTasksFile::parse(&content) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "workspace config unparseable, treating as no dependencies"
                );
                return TaskDependencies::default();
            }
        };

        let Some(def) = file.get(label) else {
            return TaskDependencies::default();
        };

        TaskDependencies {
            deps: def
                .depends_on
                .iter()
                .filter_map(|d| d.name().map(|n| n.to_string()))
                .collect(),
            order: def.depends_order,
        }
    }
}

#[cfg(test)]
#[path = "deps_tests.rs"]
mod tests;
