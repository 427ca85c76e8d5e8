// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task states, terminal results, and execution records

use crate::id::TaskId;
use serde::{Deserialize, Serialize};

/// Synthetic exit code for a task failed by dependency propagation.
pub const EXIT_DEPENDENCY_FAILED: i32 = -1;

/// Exit code reported for tasks cancelled by the stop protocol.
pub const EXIT_STOPPED: i32 = 130;

/// Live state of a tracked task.
///
/// Absence from the tracker means idle/unknown; `stopped` is signalled
/// by removal, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Running,
    Stopping,
    Failed,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Running => write!(f, "running"),
            TaskState::Stopping => write!(f, "stopping"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// Terminal outcome of a task execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub exit_code: i32,
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Set when this result was synthesized by failure propagation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_dependency: Option<TaskId>,
    pub timestamp_ms: u64,
    pub duration_ms: u64,
    #[serde(default)]
    pub subtasks: Vec<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task: Option<TaskId>,
}

impl TaskResult {
    /// Result for a task that ended with the given host exit code.
    pub fn from_exit(
        exit_code: i32,
        timestamp_ms: u64,
        duration_ms: u64,
        subtasks: Vec<TaskId>,
        parent_task: Option<TaskId>,
    ) -> Self {
        Self {
            exit_code,
            failed: exit_code != 0,
            reason: None,
            failed_dependency: None,
            timestamp_ms,
            duration_ms,
            subtasks,
            parent_task,
        }
    }

    /// Synthetic result for a parent failed by one of its dependencies.
    pub fn dependency_failure(
        failed_dependency: TaskId,
        child_exit_code: i32,
        timestamp_ms: u64,
        duration_ms: u64,
        subtasks: Vec<TaskId>,
        parent_task: Option<TaskId>,
    ) -> Self {
        Self {
            exit_code: EXIT_DEPENDENCY_FAILED,
            failed: true,
            reason: Some(format!(
                "Dependency failed: {} (exit code {})",
                failed_dependency.name(),
                child_exit_code
            )),
            failed_dependency: Some(failed_dependency),
            timestamp_ms,
            duration_ms,
            subtasks,
            parent_task,
        }
    }
}

/// One line of the per-workspace execution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub task: TaskId,
    pub exit_code: i32,
    pub failed: bool,
    pub timestamp_ms: u64,
    pub duration_ms: u64,
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
