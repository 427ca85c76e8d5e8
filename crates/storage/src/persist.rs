// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized read-modify-write persistence over the two KV stores
//!
//! The backends are "get full object, mutate, put full object", so every
//! mutating operation here runs under one async mutex; interleaved
//! writers would otherwise lose updates. Failures are logged inside the
//! chain and the chain continues; in-memory engine state stays
//! authoritative. Readers do not lock.

use crate::kv::{KvStore, StorageError};
use crate::migration;
use ob_core::{ExecutionRecord, PanelState, PanelStateUpdate, TaskId, TaskResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Rolling per-task duration window length.
pub const TASK_HISTORY_WINDOW: usize = 10;
/// Most-recently-used task list cap.
pub const RECENTS_CAP: usize = 5;
/// Starred task list cap.
pub const STARS_CAP: usize = 20;
/// Navigation history cap.
pub const NAV_CAP: usize = 10;
/// Execution history cap.
pub const EXECUTION_HISTORY_CAP: usize = 20;

// Global store keys
const KEY_TASK_HISTORY: &str = "taskHistory";
const KEY_RECENTS: &str = "recentlyUsedTasks";
const KEY_STARS: &str = "starredTasks";
const KEY_PANEL: &str = "panelState";

// Workspace store keys
const KEY_NAV_HISTORY: &str = "navigationHistory";
const KEY_NAV_INDEX: &str = "navigationIndex";
const KEY_EXECUTION_HISTORY: &str = "executionHistory";
const KEY_COMPLETED: &str = "completedTasks";
const KEY_LEGACY_FAILED: &str = "failedTasks";

/// Rolling duration history for one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskHistory {
    /// Last [`TASK_HISTORY_WINDOW`] successful durations, oldest first
    #[serde(default)]
    pub durations: Vec<u64>,
    /// Total successful runs ever recorded
    #[serde(default)]
    pub count: u64,
}

impl TaskHistory {
    /// Average of the windowed durations, `None` when empty.
    pub fn average(&self) -> Option<u64> {
        if self.durations.is_empty() {
            return None;
        }
        Some(self.durations.iter().sum::<u64>() / self.durations.len() as u64)
    }
}

/// Façade over the global and per-workspace stores.
pub struct Persistence {
    global: Arc<dyn KvStore>,
    workspace: Arc<dyn KvStore>,
    write_gate: Mutex<()>,
}

async fn read_or_default<T: DeserializeOwned + Default>(store: &dyn KvStore, key: &str) -> T {
    match store.get(key).await {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(key, error = %e, "stored value unreadable, using default");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "store read failed, using default");
            T::default()
        }
    }
}

async fn write_value<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    let json = match serde_json::to_value(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(key, error = %e, "value serialization failed, skipping write");
            return;
        }
    };
    if let Err(e) = store.put(key, json).await {
        warn!(key, error = %e, "store write failed, in-memory state stays authoritative");
    }
}

impl Persistence {
    pub fn new(global: Arc<dyn KvStore>, workspace: Arc<dyn KvStore>) -> Self {
        Self {
            global,
            workspace,
            write_gate: Mutex::new(()),
        }
    }

    // --- task history ---

    /// Record one successful duration; returns the updated history.
    pub async fn update_task_history(&self, task: &TaskId, duration_ms: u64) -> TaskHistory {
        let _gate = self.write_gate.lock().await;
        let mut histories: HashMap<TaskId, TaskHistory> =
            read_or_default(self.global.as_ref(), KEY_TASK_HISTORY).await;
        let history = histories.entry(task.clone()).or_default();
        history.durations.push(duration_ms);
        if history.durations.len() > TASK_HISTORY_WINDOW {
            let excess = history.durations.len() - TASK_HISTORY_WINDOW;
            history.durations.drain(..excess);
        }
        history.count += 1;
        let updated = history.clone();
        write_value(self.global.as_ref(), KEY_TASK_HISTORY, &histories).await;
        updated
    }

    pub async fn task_history(&self, task: &TaskId) -> TaskHistory {
        let histories: HashMap<TaskId, TaskHistory> =
            read_or_default(self.global.as_ref(), KEY_TASK_HISTORY).await;
        histories.get(task).cloned().unwrap_or_default()
    }

    // --- recently used ---

    /// Push to the front of the MRU list (dedup, cap); returns the list.
    pub async fn add_recently_used(&self, task: &TaskId) -> Vec<TaskId> {
        let _gate = self.write_gate.lock().await;
        let mut recents: Vec<TaskId> = read_or_default(self.global.as_ref(), KEY_RECENTS).await;
        recents.retain(|t| t != task);
        recents.insert(0, task.clone());
        recents.truncate(RECENTS_CAP);
        write_value(self.global.as_ref(), KEY_RECENTS, &recents).await;
        recents
    }

    pub async fn recently_used(&self) -> Vec<TaskId> {
        read_or_default(self.global.as_ref(), KEY_RECENTS).await
    }

    // --- stars ---

    /// Flip membership in the starred set; returns the list.
    pub async fn toggle_star(&self, task: &TaskId) -> Vec<TaskId> {
        let _gate = self.write_gate.lock().await;
        let mut starred: Vec<TaskId> = read_or_default(self.global.as_ref(), KEY_STARS).await;
        let before = starred.len();
        starred.retain(|t| t != task);
        if starred.len() == before {
            starred.push(task.clone());
            if starred.len() > STARS_CAP {
                let excess = starred.len() - STARS_CAP;
                starred.drain(..excess);
            }
        }
        write_value(self.global.as_ref(), KEY_STARS, &starred).await;
        starred
    }

    pub async fn starred(&self) -> Vec<TaskId> {
        read_or_default(self.global.as_ref(), KEY_STARS).await
    }

    // --- panel state ---

    /// Merge a partial update and persist; returns the merged state.
    pub async fn update_panel_state(&self, update: &PanelStateUpdate) -> PanelState {
        let _gate = self.write_gate.lock().await;
        let mut state: PanelState = read_or_default(self.global.as_ref(), KEY_PANEL).await;
        state.merge(update);
        write_value(self.global.as_ref(), KEY_PANEL, &state).await;
        state
    }

    pub async fn panel_state(&self) -> PanelState {
        read_or_default(self.global.as_ref(), KEY_PANEL).await
    }

    // --- navigation ---

    /// Persist the navigation entries and cursor, enforcing the cap.
    pub async fn save_navigation(&self, entries: &[String], index: usize) {
        let _gate = self.write_gate.lock().await;
        let mut entries = entries.to_vec();
        let mut index = index;
        if entries.len() > NAV_CAP {
            let excess = entries.len() - NAV_CAP;
            entries.drain(..excess);
            index = index.saturating_sub(excess);
        }
        let index = index.min(entries.len().saturating_sub(1));
        write_value(self.workspace.as_ref(), KEY_NAV_HISTORY, &entries).await;
        write_value(self.workspace.as_ref(), KEY_NAV_INDEX, &index).await;
    }

    pub async fn navigation(&self) -> (Vec<String>, usize) {
        let entries: Vec<String> =
            read_or_default(self.workspace.as_ref(), KEY_NAV_HISTORY).await;
        let index: usize = read_or_default(self.workspace.as_ref(), KEY_NAV_INDEX).await;
        let index = index.min(entries.len().saturating_sub(1));
        (entries, index)
    }

    // --- execution history ---

    /// Prepend one record, newest first, enforcing the cap.
    pub async fn add_execution_record(&self, record: ExecutionRecord) {
        let _gate = self.write_gate.lock().await;
        let mut records: Vec<ExecutionRecord> =
            read_or_default(self.workspace.as_ref(), KEY_EXECUTION_HISTORY).await;
        records.insert(0, record);
        records.truncate(EXECUTION_HISTORY_CAP);
        write_value(self.workspace.as_ref(), KEY_EXECUTION_HISTORY, &records).await;
    }

    pub async fn execution_history(&self) -> Vec<ExecutionRecord> {
        read_or_default(self.workspace.as_ref(), KEY_EXECUTION_HISTORY).await
    }

    // --- completed tasks ---

    /// All persisted completions, migrating the legacy `failedTasks` key
    /// on first access.
    pub async fn completed_tasks(&self) -> HashMap<TaskId, TaskResult> {
        let legacy_present = matches!(
            self.workspace.get(KEY_LEGACY_FAILED).await,
            Ok(Some(_))
        );
        if !legacy_present {
            return read_or_default(self.workspace.as_ref(), KEY_COMPLETED).await;
        }

        // Legacy key found: merge under the write gate, then drop it.
        let _gate = self.write_gate.lock().await;
        let mut completed: HashMap<TaskId, TaskResult> =
            read_or_default(self.workspace.as_ref(), KEY_COMPLETED).await;
        let legacy: HashMap<TaskId, TaskResult> =
            read_or_default(self.workspace.as_ref(), KEY_LEGACY_FAILED).await;
        migration::merge_legacy_completions(&mut completed, legacy);
        write_value(self.workspace.as_ref(), KEY_COMPLETED, &completed).await;
        if let Err(e) = self.workspace.remove(KEY_LEGACY_FAILED).await {
            warn!(error = %e, "failed to drop legacy failedTasks key");
        }
        completed
    }

    pub async fn save_completed_task(&self, task: &TaskId, result: &TaskResult) {
        let _gate = self.write_gate.lock().await;
        let mut completed: HashMap<TaskId, TaskResult> =
            read_or_default(self.workspace.as_ref(), KEY_COMPLETED).await;
        completed.insert(task.clone(), result.clone());
        write_value(self.workspace.as_ref(), KEY_COMPLETED, &completed).await;
    }

    /// Remove one completion record; no-op when absent.
    pub async fn clear_completed_task(&self, task: &TaskId) {
        self.clear_completed_tasks(std::slice::from_ref(task)).await;
    }

    /// Remove several completion records in one read-modify-write.
    pub async fn clear_completed_tasks(&self, tasks: &[TaskId]) {
        let _gate = self.write_gate.lock().await;
        let mut completed: HashMap<TaskId, TaskResult> =
            read_or_default(self.workspace.as_ref(), KEY_COMPLETED).await;
        let before = completed.len();
        for task in tasks {
            completed.remove(task);
        }
        if completed.len() != before {
            write_value(self.workspace.as_ref(), KEY_COMPLETED, &completed).await;
        }
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
