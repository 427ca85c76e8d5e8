// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-event handling
//!
//! End events are not queued: they are causal leaves of the dependency
//! chain, so processing them directly cannot reorder anything the view
//! cares about.

use super::Orchestrator;
use crate::event::EndEvent;
use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{Clock, ExecutionRecord, TaskResult, TaskState, ViewMessage};

impl<H, T, N, C> Orchestrator<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    /// Process one host end event.
    pub async fn on_task_end(&self, event: EndEvent) {
        let id = event.task.id();
        let exit_code = event.exit_code.unwrap_or(0);
        let failed = exit_code != 0;

        // Stop protocol owns this task's teardown: drop the host's event
        if self.tracker.state(&id) == Some(TaskState::Stopping) || self.tracker.take_cancelled(&id)
        {
            tracing::debug!(task = %id, "end for stopping/cancelled task, dropping");
            self.clear_tracking(&id);
            return;
        }

        let subtasks = self.hierarchy.children(&id);
        let parents = self.hierarchy.parents_of(&id);
        let parent = parents.first().cloned();

        let end_epoch = self.clock.epoch_ms();
        let duration_ms = self
            .tracker
            .start_time(&id)
            .map(|(instant, _)| {
                self.clock
                    .now()
                    .saturating_duration_since(instant)
                    .as_millis() as u64
            })
            .unwrap_or(0);

        self.persistence
            .add_execution_record(ExecutionRecord {
                task: id.clone(),
                exit_code,
                failed,
                timestamp_ms: end_epoch,
                duration_ms,
            })
            .await;

        if !failed {
            self.persistence
                .update_task_history(&id, duration_ms)
                .await;
        }

        let result = TaskResult::from_exit(
            exit_code,
            end_epoch,
            duration_ms,
            subtasks.clone(),
            parent.clone(),
        );
        self.tracker.set_result(&id, result.clone());
        self.persistence.save_completed_task(&id, &result).await;

        for parent_id in &parents {
            self.emit(ViewMessage::SubtaskEnded {
                parent: parent_id.clone(),
                child: id.clone(),
                exit_code,
                failed,
            });
            if failed {
                self.propagate_failure(parent_id, &id, exit_code).await;
            }
        }

        self.clear_tracking(&id);

        self.emit(ViewMessage::TaskCompleted {
            task_label: id.clone(),
            exit_code,
            failed,
            reason: result.reason,
            failed_dependency: result.failed_dependency,
            duration: duration_ms,
            subtasks,
            parent_task: parent,
        });
        tracing::info!(task = %id, exit_code, failed, "task ended");
    }
}
