// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host task descriptors and dependency metadata

use crate::id::TaskId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Origin of a task definition.
///
/// Resolution prefers `Workspace` over every other source (see the
/// engine resolver); keep comparisons on this type rather than on raw
/// strings so the precedence rule stays in one place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskSource {
    /// Defined in the workspace config file
    Workspace,
    /// Auto-detected package manifest script
    Npm,
    /// Any other provider, carried verbatim
    Other(String),
}

impl TaskSource {
    pub fn parse(s: &str) -> Self {
        match s {
            "workspace" => TaskSource::Workspace,
            "npm" => TaskSource::Npm,
            other => TaskSource::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskSource::Workspace => "workspace",
            TaskSource::Npm => "npm",
            TaskSource::Other(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for TaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TaskSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TaskSource::parse(&s))
    }
}

/// Whether a task's dependencies run concurrently or one after another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependsOrder {
    #[default]
    Parallel,
    Sequence,
}

/// Ordered dependency names plus their order tag, as declared by the task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependencies {
    pub deps: Vec<String>,
    #[serde(default)]
    pub order: DependsOrder,
}

/// A task as enumerated by the host environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTask {
    pub name: String,
    pub source: TaskSource,
    /// File the task is defined in, when the host knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_path: Option<PathBuf>,
    /// Short human description (e.g. the underlying command line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Dependencies declared directly in the task's metadata.
    ///
    /// `None` means "not declared here"; the dependency reader then
    /// consults the workspace config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<TaskDependencies>,
}

impl HostTask {
    pub fn new(source: TaskSource, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source,
            definition_path: None,
            detail: None,
            depends_on: None,
        }
    }

    /// Canonical `source|name` ID for this task.
    pub fn id(&self) -> TaskId {
        TaskId::from_parts(&self.source, &self.name)
    }

    /// Label shown to the operator: workspace tasks go by bare name,
    /// everything else is prefixed with its source.
    pub fn display_label(&self) -> String {
        match self.source {
            TaskSource::Workspace => self.name.clone(),
            _ => format!("{}: {}", self.source, self.name),
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
