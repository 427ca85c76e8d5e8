// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-event handling and proxy-parent synthesis

use super::Orchestrator;
use crate::event::StartEvent;
use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{Clock, ReportedState, TaskId, TaskState, ViewMessage};
use std::collections::HashSet;

impl<H, T, N, C> Orchestrator<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    /// Process one host start event.
    ///
    /// The whole step, including every await, runs under the start
    /// gate, so concurrent starts are handled one at a time in arrival
    /// order. This is what keeps a child's `taskStarted` from reaching
    /// the view before its parent's.
    pub async fn on_task_start(&self, event: StartEvent) {
        let _gate = self.start_gate.lock().await;
        self.handle_start(event).await;
    }

    async fn handle_start(&self, event: StartEvent) {
        let id = event.task.id();

        // Duplicate host event: already running with a live handle
        if self.tracker.state(&id) == Some(TaskState::Running)
            && self.tracker.has_execution(&id)
            && !self.tracker.is_pending(&id)
        {
            tracing::debug!(task = %id, "duplicate start event, dropping");
            return;
        }

        // Cancelled by the stop protocol: consume the marker and drop
        if self.tracker.take_cancelled(&id) {
            tracing::debug!(task = %id, "start for cancelled task, dropping");
            return;
        }

        let now = self.clock.now();
        let epoch_ms = self.clock.epoch_ms();
        self.tracker.set_state(&id, TaskState::Running);
        self.tracker.set_start_time(&id, now, epoch_ms);
        if let Some(handle) = event.handle {
            self.tracker.set_execution(&id, handle);
        }
        self.tracker.take_pending(&id);
        self.tracker.clear_result(&id);
        self.persistence.clear_completed_task(&id).await;

        // Register this task's own dependency tree
        let all_tasks = self.fetch_tasks_or_empty().await;
        self.hierarchy
            .register_dependency_tree(&id, &all_tasks, &self.reader, &mut HashSet::new());

        // Discover parents in case this started as a dep of something
        // the engine didn't launch; keep their handles so stop can reach
        // them.
        let active = self.host.active_executions().await;
        for (parent_id, handle) in
            self.hierarchy
                .discover_parents(&id, &active, &all_tasks, &self.reader)
        {
            if !self.tracker.has_execution(&parent_id) {
                self.tracker.set_execution(&parent_id, handle);
                if self.tracker.state(&parent_id) != Some(TaskState::Running) {
                    self.tracker.mark_pending(&parent_id);
                }
            }
        }

        // Parent first: its messages must reach the view before ours
        let parent = self.hierarchy.find_parent_like(&id);
        if let Some(parent_id) = &parent {
            self.ensure_parent_running(parent_id).await;
            let parent_start = self
                .tracker
                .start_time(parent_id)
                .map(|(_, e)| e)
                .unwrap_or(epoch_ms);
            self.emit(ViewMessage::SubtaskStarted {
                parent: parent_id.clone(),
                child: id.clone(),
                parent_start_time: parent_start,
            });
        }

        let history = self.persistence.task_history(&id).await;
        self.emit(ViewMessage::TaskStarted {
            task_label: id.clone(),
            start_time: epoch_ms,
            avg_duration: history.average(),
            is_first_run: history.count == 0,
            subtasks: self.hierarchy.children(&id),
            state: ReportedState::Running,
            is_dependency_proxy: false,
            parent_task: parent,
        });
        tracing::info!(task = %id, "task started");
    }

    /// Advertise a parent as running before the host has started it.
    ///
    /// Typical when the host runs deps first and the parent is blocked
    /// on them. State and start time are written before the first await
    /// so a re-entrant setup sees `running` and returns on the fast
    /// path.
    pub(crate) async fn ensure_parent_running(&self, pid: &TaskId) {
        if self.tracker.state(pid) == Some(TaskState::Running) {
            return;
        }
        if !self.tracker.begin_proxy_setup(pid) {
            return;
        }

        let epoch_ms = self.clock.epoch_ms();
        self.tracker.set_state(pid, TaskState::Running);
        self.tracker.set_start_time(pid, self.clock.now(), epoch_ms);

        // Grandparent chain first, then the edge down to us
        let grandparent = self.hierarchy.find_parent_like(pid);
        if let Some(gp) = &grandparent {
            Box::pin(self.ensure_parent_running(gp)).await;
            let gp_start = self
                .tracker
                .start_time(gp)
                .map(|(_, e)| e)
                .unwrap_or(epoch_ms);
            self.emit(ViewMessage::SubtaskStarted {
                parent: gp.clone(),
                child: pid.clone(),
                parent_start_time: gp_start,
            });
        }

        let history = self.persistence.task_history(pid).await;
        self.emit(ViewMessage::TaskStarted {
            task_label: pid.clone(),
            start_time: epoch_ms,
            avg_duration: history.average(),
            is_first_run: history.count == 0,
            subtasks: self.hierarchy.children(pid),
            state: ReportedState::Running,
            is_dependency_proxy: true,
            parent_task: grandparent,
        });
        self.emit(ViewMessage::TaskStateChanged {
            task_label: pid.clone(),
            state: ReportedState::Running,
            can_stop: true,
            can_focus: false,
        });
        tracing::info!(task = %pid, "proxy parent advertised as running");

        self.tracker.end_proxy_setup(pid);
    }
}
