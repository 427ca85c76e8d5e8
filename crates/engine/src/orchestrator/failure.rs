// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upward failure propagation
//!
//! A failed dependency fails every ancestor: each gets a synthetic
//! result with exit code -1, its live execution is best-effort
//! terminated, and the chain recurses to the top. A visited set makes a
//! cyclic hierarchy terminate instead of storming.

use super::Orchestrator;
use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{Clock, ExecutionRecord, TaskId, TaskResult, ViewMessage, EXIT_DEPENDENCY_FAILED};
use std::collections::HashSet;

impl<H, T, N, C> Orchestrator<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    pub(crate) async fn propagate_failure(
        &self,
        parent: &TaskId,
        failed_child: &TaskId,
        child_exit_code: i32,
    ) {
        let mut visited = HashSet::new();
        visited.insert(failed_child.clone());
        self.propagate_failure_inner(parent, failed_child, child_exit_code, &mut visited)
            .await;
    }

    async fn propagate_failure_inner(
        &self,
        parent: &TaskId,
        failed_child: &TaskId,
        child_exit_code: i32,
        visited: &mut HashSet<TaskId>,
    ) {
        if !visited.insert(parent.clone()) {
            tracing::debug!(task = %parent, "failure propagation revisited a node, stopping");
            return;
        }

        let end_epoch = self.clock.epoch_ms();
        let duration_ms = self
            .tracker
            .start_time(parent)
            .map(|(instant, _)| {
                self.clock
                    .now()
                    .saturating_duration_since(instant)
                    .as_millis() as u64
            })
            .unwrap_or(0);
        let grandparent = self.hierarchy.find_parent_like(parent);
        let subtasks = self.hierarchy.children(parent);

        let result = TaskResult::dependency_failure(
            failed_child.clone(),
            child_exit_code,
            end_epoch,
            duration_ms,
            subtasks.clone(),
            grandparent.clone(),
        );
        self.tracker.set_result(parent, result.clone());
        self.persistence.save_completed_task(parent, &result).await;

        // The parent's own process is now pointless; try to stop it
        if let Some(handle) = self.tracker.execution(parent) {
            if let Err(e) = handle.terminate().await {
                tracing::warn!(task = %parent, error = %e, "terminate after dependency failure failed");
            }
        }

        self.persistence
            .add_execution_record(ExecutionRecord {
                task: parent.clone(),
                exit_code: EXIT_DEPENDENCY_FAILED,
                failed: true,
                timestamp_ms: end_epoch,
                duration_ms,
            })
            .await;

        self.emit(ViewMessage::TaskCompleted {
            task_label: parent.clone(),
            exit_code: EXIT_DEPENDENCY_FAILED,
            failed: true,
            reason: result.reason,
            failed_dependency: result.failed_dependency,
            duration: duration_ms,
            subtasks,
            parent_task: grandparent.clone(),
        });
        tracing::info!(
            task = %parent,
            failed_dependency = %failed_child,
            "task failed via dependency"
        );

        self.clear_tracking(parent);

        if let Some(gp) = grandparent {
            // The grandparent's failed dependency is this parent
            Box::pin(self.propagate_failure_inner(
                &gp,
                parent,
                EXIT_DEPENDENCY_FAILED,
                visited,
            ))
            .await;
        }
    }
}
