// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run protocol
//!
//! Launching a task first evicts the stale group it belongs to: both
//! the in-memory tree and the persisted completions reachable from the
//! top-most ancestor. The view never sees a mix of old and new
//! outcomes for one tree.

use super::Orchestrator;
use crate::resolver;
use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{Clock, TaskId, ViewMessage};
use std::collections::HashSet;

impl<H, T, N, C> Orchestrator<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    /// Launch a task by ID or name.
    pub async fn run_task(&self, arg: &str) {
        let all_tasks = self.fetch_tasks_or_empty().await;
        let task = match resolver::resolve(&all_tasks, arg).cloned() {
            Some(task) => task,
            None => {
                let error = crate::EngineError::NotFound(arg.to_string());
                tracing::warn!(label = arg, "runTask: no such task");
                let _ = self.notifier.error(&error.to_string()).await;
                self.emit(ViewMessage::Error {
                    message: error.to_string(),
                });
                return;
            }
        };
        let id = task.id();

        // Top-most ancestor; when the live hierarchy has none, walk up
        // through persisted parents whose recorded subtasks include us.
        // This covers re-running a grandchild of a long-completed group.
        let mut topmost = self.hierarchy.topmost(&id);
        if topmost == id {
            topmost = self.persisted_topmost(&id).await;
        }

        self.emit(ViewMessage::DismissTaskGroup {
            label: topmost.clone(),
        });

        // Evict the whole in-memory tree
        let mut nodes = vec![topmost.clone()];
        nodes.extend(self.hierarchy.all_descendants(&topmost));
        for node in &nodes {
            self.tracker.take_cancelled(node);
            self.tracker.unmark_stopping(node);
            self.tracker.clear_result(node);
            self.clear_tracking(node);
        }

        // Evict persisted completions reachable through recorded subtasks
        let completed = self.persistence.completed_tasks().await;
        let mut to_clear = Vec::new();
        let mut stack = vec![topmost.clone()];
        let mut visited = HashSet::new();
        while let Some(node) = stack.pop() {
            if !visited.insert(node.clone()) {
                continue;
            }
            if let Some(result) = completed.get(&node) {
                stack.extend(result.subtasks.iter().cloned());
            }
            self.tracker.clear_result(&node);
            to_clear.push(node);
        }
        self.persistence.clear_completed_tasks(&to_clear).await;

        // Fresh registration for the tree we are about to start
        self.hierarchy
            .register_dependency_tree(&id, &all_tasks, &self.reader, &mut HashSet::new());

        match self.host.execute_task(&task).await {
            Ok(handle) => {
                self.tracker.set_execution(&id, handle);
                // Handle recorded, but the start event hasn't arrived yet
                self.tracker.mark_pending(&id);
                tracing::info!(task = %id, "task launched");
            }
            Err(e) => {
                tracing::warn!(task = %id, error = %e, "executeTask failed");
                let message = format!("Failed to run task '{}': {e}", task.display_label());
                let _ = self.notifier.error(&message).await;
                self.emit(ViewMessage::Error { message });
                return;
            }
        }

        let recents = self.persistence.add_recently_used(&id).await;
        self.emit(ViewMessage::UpdateRecentlyUsed { tasks: recents });
    }

    /// Walk up through persisted results whose subtasks contain the
    /// current node. Cycle-guarded like every other ascent.
    async fn persisted_topmost(&self, id: &TaskId) -> TaskId {
        let completed = self.persistence.completed_tasks().await;
        let mut current = id.clone();
        let mut visited = HashSet::new();
        visited.insert(current.clone());
        loop {
            let parent = completed
                .iter()
                .find(|(pid, result)| **pid != current && result.subtasks.contains(&current))
                .map(|(pid, _)| pid.clone());
            match parent {
                Some(pid) if visited.insert(pid.clone()) => current = pid,
                _ => return current,
            }
        }
    }
}
