// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task live tracking
//!
//! States, execution handles, start times, terminal results, and the
//! transient guard sets of the stop protocol. Absence from the state map
//! means idle/unknown; "stopped" is signalled by removal.

use ob_adapters::ExecutionHandle;
use ob_core::{TaskId, TaskResult, TaskState};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

#[derive(Default)]
struct TrackerState {
    states: HashMap<TaskId, TaskState>,
    start_times: HashMap<TaskId, (Instant, u64)>,
    executions: HashMap<TaskId, Arc<dyn ExecutionHandle>>,
    results: HashMap<TaskId, TaskResult>,
    /// Ignore the next host event for these IDs (stop protocol)
    cancelled: HashSet<TaskId>,
    /// Re-entrancy guard for the stop protocol
    stopping: HashSet<TaskId>,
    /// Handle recorded but process not started yet
    pending: HashSet<TaskId>,
    /// Proxy-parent setup in flight within the current start step
    proxy_setup: HashSet<TaskId>,
}

/// Engine-owned store of live task bookkeeping.
#[derive(Default)]
pub struct Tracker {
    inner: Mutex<TrackerState>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    // --- states ---

    pub fn state(&self, id: &TaskId) -> Option<TaskState> {
        self.inner.lock().states.get(id).copied()
    }

    pub fn set_state(&self, id: &TaskId, state: TaskState) {
        self.inner.lock().states.insert(id.clone(), state);
    }

    pub fn running_tasks(&self) -> Vec<TaskId> {
        self.inner
            .lock()
            .states
            .iter()
            .filter(|(_, s)| **s == TaskState::Running)
            .map(|(id, _)| id.clone())
            .collect()
    }

    // --- start times ---

    pub fn start_time(&self, id: &TaskId) -> Option<(Instant, u64)> {
        self.inner.lock().start_times.get(id).copied()
    }

    pub fn set_start_time(&self, id: &TaskId, instant: Instant, epoch_ms: u64) {
        self.inner
            .lock()
            .start_times
            .insert(id.clone(), (instant, epoch_ms));
    }

    // --- execution handles ---

    pub fn execution(&self, id: &TaskId) -> Option<Arc<dyn ExecutionHandle>> {
        self.inner.lock().executions.get(id).cloned()
    }

    pub fn set_execution(&self, id: &TaskId, handle: Arc<dyn ExecutionHandle>) {
        self.inner.lock().executions.insert(id.clone(), handle);
    }

    pub fn has_execution(&self, id: &TaskId) -> bool {
        self.inner.lock().executions.contains_key(id)
    }

    // --- results ---

    pub fn result(&self, id: &TaskId) -> Option<TaskResult> {
        self.inner.lock().results.get(id).cloned()
    }

    pub fn set_result(&self, id: &TaskId, result: TaskResult) {
        self.inner.lock().results.insert(id.clone(), result);
    }

    pub fn clear_result(&self, id: &TaskId) {
        self.inner.lock().results.remove(id);
    }

    pub fn results(&self) -> HashMap<TaskId, TaskResult> {
        self.inner.lock().results.clone()
    }

    // --- cancellation set ---

    pub fn mark_cancelled(&self, id: &TaskId) {
        self.inner.lock().cancelled.insert(id.clone());
    }

    pub fn is_cancelled(&self, id: &TaskId) -> bool {
        self.inner.lock().cancelled.contains(id)
    }

    /// Consume a cancellation entry: returns true (and removes it) when present.
    pub fn take_cancelled(&self, id: &TaskId) -> bool {
        self.inner.lock().cancelled.remove(id)
    }

    // --- stopping set ---

    pub fn mark_stopping(&self, id: &TaskId) -> bool {
        self.inner.lock().stopping.insert(id.clone())
    }

    pub fn is_stopping(&self, id: &TaskId) -> bool {
        self.inner.lock().stopping.contains(id)
    }

    pub fn unmark_stopping(&self, id: &TaskId) {
        self.inner.lock().stopping.remove(id);
    }

    // --- pending executions ---

    pub fn mark_pending(&self, id: &TaskId) {
        self.inner.lock().pending.insert(id.clone());
    }

    pub fn take_pending(&self, id: &TaskId) -> bool {
        self.inner.lock().pending.remove(id)
    }

    pub fn is_pending(&self, id: &TaskId) -> bool {
        self.inner.lock().pending.contains(id)
    }

    // --- proxy setup guard ---

    /// Begin proxy-parent setup; false when one is already in flight.
    pub fn begin_proxy_setup(&self, id: &TaskId) -> bool {
        self.inner.lock().proxy_setup.insert(id.clone())
    }

    pub fn end_proxy_setup(&self, id: &TaskId) {
        self.inner.lock().proxy_setup.remove(id);
    }

    /// Drop all live bookkeeping for a task: state, start time, handle,
    /// pending flag. Results and the cancellation/stopping sets have
    /// their own lifecycles and are untouched.
    pub fn clear_tracking(&self, id: &TaskId) {
        let mut inner = self.inner.lock();
        inner.states.remove(id);
        inner.start_times.remove(id);
        inner.executions.remove(id);
        inner.pending.remove(id);
    }

    /// Test hook: is any bookkeeping left for this ID?
    pub fn is_tracked(&self, id: &TaskId) -> bool {
        let inner = self.inner.lock();
        inner.states.contains_key(id)
            || inner.start_times.contains_key(id)
            || inner.executions.contains_key(id)
            || inner.pending.contains(id)
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
