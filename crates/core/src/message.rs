// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound messages from the engine to the view
//!
//! Every message is a side-effect-free description of state. The stream
//! is append-only and idempotent on reconnect: `ready` replays enough of
//! it to make a fresh view whole.

use crate::id::TaskId;
use crate::panel::PanelState;
use crate::state::ExecutionRecord;
use crate::task::{DependsOrder, TaskSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Task state as reported to the view.
///
/// Unlike [`crate::state::TaskState`], this includes `stopped`, which the
/// tracker itself never stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedState {
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl std::fmt::Display for ReportedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportedState::Running => write!(f, "running"),
            ReportedState::Stopping => write!(f, "stopping"),
            ReportedState::Stopped => write!(f, "stopped"),
            ReportedState::Failed => write!(f, "failed"),
        }
    }
}

/// One node of a resolved dependency tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependsNode {
    pub id: TaskId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsNode>,
    #[serde(default)]
    pub depends_order: DependsOrder,
}

/// A task entry in `updateTasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub id: TaskId,
    pub label: String,
    pub display_label: String,
    pub source: TaskSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsNode>,
    #[serde(default)]
    pub depends_order: DependsOrder,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Messages the engine emits to the view.
///
/// Serializes with `{"type": "messageName", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewMessage {
    #[serde(rename_all = "camelCase")]
    UpdateTasks { tasks: Vec<TaskInfo> },

    #[serde(rename_all = "camelCase")]
    TaskStarted {
        task_label: TaskId,
        start_time: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avg_duration: Option<u64>,
        is_first_run: bool,
        #[serde(default)]
        subtasks: Vec<TaskId>,
        state: ReportedState,
        /// True when the engine advertises a parent the host hasn't started
        #[serde(default, skip_serializing_if = "is_false")]
        is_dependency_proxy: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_task: Option<TaskId>,
    },

    #[serde(rename_all = "camelCase")]
    TaskCompleted {
        task_label: TaskId,
        exit_code: i32,
        failed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failed_dependency: Option<TaskId>,
        duration: u64,
        #[serde(default)]
        subtasks: Vec<TaskId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_task: Option<TaskId>,
    },

    /// Synthetic terminations (stop protocol), distinct from `taskCompleted`
    #[serde(rename_all = "camelCase")]
    TaskEnded {
        task_label: TaskId,
        exit_code: i32,
        duration: u64,
        #[serde(default)]
        subtasks: Vec<TaskId>,
    },

    #[serde(rename_all = "camelCase")]
    SubtaskStarted {
        parent: TaskId,
        child: TaskId,
        parent_start_time: u64,
    },

    #[serde(rename_all = "camelCase")]
    SubtaskEnded {
        parent: TaskId,
        child: TaskId,
        exit_code: i32,
        failed: bool,
    },

    #[serde(rename_all = "camelCase")]
    TaskStateChanged {
        task_label: TaskId,
        state: ReportedState,
        can_stop: bool,
        can_focus: bool,
    },

    #[serde(rename_all = "camelCase")]
    DismissTaskGroup { label: TaskId },

    #[serde(rename_all = "camelCase")]
    UpdateNavigationHistory { entries: Vec<String>, index: usize },

    #[serde(rename_all = "camelCase")]
    UpdateRecentlyUsed { tasks: Vec<TaskId> },

    #[serde(rename_all = "camelCase")]
    UpdateStarred { tasks: Vec<TaskId> },

    #[serde(rename_all = "camelCase")]
    ExecutionHistory { records: Vec<ExecutionRecord> },

    #[serde(rename_all = "camelCase")]
    PanelState { state: PanelState },

    #[serde(rename_all = "camelCase")]
    LogBuffer { lines: Vec<String> },

    #[serde(rename_all = "camelCase")]
    LoadMdx { file: String, content: String },

    #[serde(rename_all = "camelCase")]
    TasksJson { json: String },

    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

impl ViewMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ViewMessage::UpdateTasks { .. } => "updateTasks",
            ViewMessage::TaskStarted { .. } => "taskStarted",
            ViewMessage::TaskCompleted { .. } => "taskCompleted",
            ViewMessage::TaskEnded { .. } => "taskEnded",
            ViewMessage::SubtaskStarted { .. } => "subtaskStarted",
            ViewMessage::SubtaskEnded { .. } => "subtaskEnded",
            ViewMessage::TaskStateChanged { .. } => "taskStateChanged",
            ViewMessage::DismissTaskGroup { .. } => "dismissTaskGroup",
            ViewMessage::UpdateNavigationHistory { .. } => "updateNavigationHistory",
            ViewMessage::UpdateRecentlyUsed { .. } => "updateRecentlyUsed",
            ViewMessage::UpdateStarred { .. } => "updateStarred",
            ViewMessage::ExecutionHistory { .. } => "executionHistory",
            ViewMessage::PanelState { .. } => "panelState",
            ViewMessage::LogBuffer { .. } => "logBuffer",
            ViewMessage::LoadMdx { .. } => "loadMdx",
            ViewMessage::TasksJson { .. } => "tasksJson",
            ViewMessage::Error { .. } => "error",
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            ViewMessage::UpdateTasks { tasks } => format!("{t} tasks={}", tasks.len()),
            ViewMessage::TaskStarted {
                task_label,
                is_dependency_proxy,
                ..
            } => {
                if *is_dependency_proxy {
                    format!("{t} task={task_label} proxy=true")
                } else {
                    format!("{t} task={task_label}")
                }
            }
            ViewMessage::TaskCompleted {
                task_label,
                exit_code,
                failed,
                ..
            } => format!("{t} task={task_label} exit={exit_code} failed={failed}"),
            ViewMessage::TaskEnded {
                task_label,
                exit_code,
                ..
            } => format!("{t} task={task_label} exit={exit_code}"),
            ViewMessage::SubtaskStarted { parent, child, .. } => {
                format!("{t} parent={parent} child={child}")
            }
            ViewMessage::SubtaskEnded {
                parent,
                child,
                exit_code,
                ..
            } => format!("{t} parent={parent} child={child} exit={exit_code}"),
            ViewMessage::TaskStateChanged {
                task_label, state, ..
            } => format!("{t} task={task_label} state={state}"),
            ViewMessage::DismissTaskGroup { label } => format!("{t} label={label}"),
            ViewMessage::UpdateNavigationHistory { entries, index } => {
                format!("{t} entries={} index={index}", entries.len())
            }
            ViewMessage::UpdateRecentlyUsed { tasks } => format!("{t} tasks={}", tasks.len()),
            ViewMessage::UpdateStarred { tasks } => format!("{t} tasks={}", tasks.len()),
            ViewMessage::ExecutionHistory { records } => {
                format!("{t} records={}", records.len())
            }
            ViewMessage::PanelState { .. } => t.to_string(),
            ViewMessage::LogBuffer { lines } => format!("{t} lines={}", lines.len()),
            ViewMessage::LoadMdx { file, .. } => format!("{t} file={file}"),
            ViewMessage::TasksJson { json } => format!("{t} bytes={}", json.len()),
            ViewMessage::Error { message } => format!("{t} message={message}"),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
