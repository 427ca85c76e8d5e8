// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound command messages from the view

use crate::panel::PanelStateUpdate;
use serde::{Deserialize, Serialize};

/// Commands the view sends to the engine.
///
/// Serializes with `{"type": "commandName", ...fields}`. Unknown type
/// tags deserialize to `Unknown` so a newer view never wedges the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// View is (re)connected: replay tasks, navigation, and live state
    Ready,

    /// Load a document and push it onto the navigation history
    Navigate { file: String },

    NavigateBack,

    NavigateForward,

    /// Jump to a history entry, truncating forward history
    NavigateToHistoryItem { index: usize },

    /// Launch a task by ID or name
    RunTask { label: String },

    /// Stop a task and its whole subtree
    StopTask { label: String },

    /// Reveal the terminal a task is running in
    FocusTerminal { label: String },

    /// Open the file a task is defined in
    OpenTaskDefinition { label: String },

    /// Flip membership in the starred set
    ToggleStar { label: String },

    /// Delete a persisted completion record and its descendants
    DismissTask { label: String },

    GetTaskLists,

    GetPanelState,

    GetLogBuffer,

    GetExecutionHistory,

    /// Merge partial panel flags, persist, echo back
    SetPanelState {
        #[serde(flatten)]
        update: PanelStateUpdate,
    },

    /// Serialize the host task list for the operator's clipboard
    CopyTasksJson,

    /// Catch-all for unknown command types (forward compatibility)
    #[serde(other, skip_serializing)]
    Unknown,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ready => "ready",
            Command::Navigate { .. } => "navigate",
            Command::NavigateBack => "navigateBack",
            Command::NavigateForward => "navigateForward",
            Command::NavigateToHistoryItem { .. } => "navigateToHistoryItem",
            Command::RunTask { .. } => "runTask",
            Command::StopTask { .. } => "stopTask",
            Command::FocusTerminal { .. } => "focusTerminal",
            Command::OpenTaskDefinition { .. } => "openTaskDefinition",
            Command::ToggleStar { .. } => "toggleStar",
            Command::DismissTask { .. } => "dismissTask",
            Command::GetTaskLists => "getTaskLists",
            Command::GetPanelState => "getPanelState",
            Command::GetLogBuffer => "getLogBuffer",
            Command::GetExecutionHistory => "getExecutionHistory",
            Command::SetPanelState { .. } => "setPanelState",
            Command::CopyTasksJson => "copyTasksJson",
            Command::Unknown => "unknown",
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Command::Navigate { file } => format!("{t} file={file}"),
            Command::NavigateToHistoryItem { index } => format!("{t} index={index}"),
            Command::RunTask { label }
            | Command::StopTask { label }
            | Command::FocusTerminal { label }
            | Command::OpenTaskDefinition { label }
            | Command::ToggleStar { label }
            | Command::DismissTask { label } => format!("{t} label={label}"),
            _ => t.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
