// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace config file schema (`.opsboard/tasks.json`)
//!
//! Dependency entries are normalized here, at the boundary: downstream
//! code only ever sees plain names.

use crate::task::DependsOrder;
use serde::{Deserialize, Serialize};

/// Well-known workspace config path, relative to the workspace root.
pub const WORKSPACE_TASKS_FILE: &str = ".opsboard/tasks.json";

/// A dependency entry: a bare name or an object carrying `label` or `task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyRef {
    Name(String),
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task: Option<String>,
    },
}

impl DependencyRef {
    /// Extract the dependency name; `None` for an empty object.
    pub fn name(&self) -> Option<&str> {
        match self {
            DependencyRef::Name(name) => Some(name),
            DependencyRef::Object { label, task } => label.as_deref().or(task.as_deref()),
        }
    }
}

/// One task definition in the workspace config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceTaskDef {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependencyRef>,
    #[serde(default)]
    pub depends_order: DependsOrder,
}

/// The workspace config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceTasksFile {
    #[serde(default)]
    pub tasks: Vec<WorkspaceTaskDef>,
}

impl WorkspaceTasksFile {
    /// Parse comment-tolerant JSON config content.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&crate::jsonc::strip(content))
    }

    /// Find a task definition by label.
    pub fn get(&self, label: &str) -> Option<&WorkspaceTaskDef> {
        self.tasks.iter().find(|t| t.label == label)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
