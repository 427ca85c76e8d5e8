// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-phase stop protocol
//!
//! The host's `terminate()` is an API surface, not a guarantee: shell
//! tasks that spawn child shells leak through it. So a stop runs three
//! phases (mark and terminate every descendant, terminate the root,
//! then sweep host terminals by display-name match) and reports
//! best-effort success even when every route fails.

use super::Orchestrator;
use crate::resolver;
use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{Clock, ReportedState, TaskId, TaskState, ViewMessage, EXIT_STOPPED};

impl<H, T, N, C> Orchestrator<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    /// Stop a task and its whole subtree. Synchronous from the view's
    /// perspective: the `stopping` state change is emitted immediately,
    /// before any termination work.
    pub async fn stop_task(&self, arg: &str) {
        let all_tasks = self.fetch_tasks_or_empty().await;
        let id = match resolver::resolve(&all_tasks, arg) {
            Some(task) => task.id(),
            None => TaskId::new(arg),
        };

        // Guards: nothing to stop, or a stop already owns this task.
        // `mark_stopping` both checks and claims, so two concurrent stops
        // can't both run the terminate/sweep phases.
        let state = self.tracker.state(&id);
        if state.is_none() || state == Some(TaskState::Failed) {
            tracing::debug!(task = %id, state = ?state, "stop: nothing to do");
            self.emit_stopped_state(&id);
            return;
        }
        if !self.tracker.mark_stopping(&id) {
            tracing::debug!(task = %id, "stop already in progress");
            self.emit_stopped_state(&id);
            return;
        }

        self.tracker.set_state(&id, TaskState::Stopping);
        // Late host events for the target are the stop protocol's to drop
        self.tracker.mark_cancelled(&id);
        self.emit(ViewMessage::TaskStateChanged {
            task_label: id.clone(),
            state: ReportedState::Stopping,
            can_stop: false,
            can_focus: false,
        });

        // Proxy parents have no recorded handle; adopt one from the host
        if !self.tracker.has_execution(&id) {
            let active = self.host.active_executions().await;
            if let Some(execution) = active.iter().find(|a| a.task.id() == id) {
                self.tracker
                    .set_execution(&id, std::sync::Arc::clone(&execution.handle));
            }
        }

        let descendants = self.hierarchy.all_descendants(&id);
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
        let direct_children = self.hierarchy.children(&id);

        // Phase 1: descendants
        let active = self.host.active_executions().await;
        let mut any_terminated = false;
        for descendant in &descendants {
            self.tracker.mark_cancelled(descendant);
            let handle = self.tracker.execution(descendant).or_else(|| {
                active
                    .iter()
                    .find(|a| a.task.id() == *descendant)
                    .map(|a| std::sync::Arc::clone(&a.handle))
            });
            match handle {
                Some(handle) => match handle.terminate().await {
                    Ok(()) => any_terminated = true,
                    Err(e) => {
                        tracing::warn!(task = %descendant, error = %e, "descendant terminate failed");
                    }
                },
                None => {
                    tracing::debug!(task = %descendant, "no execution handle for descendant");
                }
            }
            self.clear_tracking(descendant);
            self.emit(ViewMessage::TaskEnded {
                task_label: descendant.clone(),
                exit_code: EXIT_STOPPED,
                duration: 0,
                subtasks: Vec::new(),
            });
        }

        // Phase 2: the root itself
        let root_terminated = match self.tracker.execution(&id) {
            Some(handle) => match handle.terminate().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(task = %id, error = %e, "root terminate failed");
                    false
                }
            },
            None => {
                tracing::debug!(task = %id, "no execution handle for stop target");
                false
            }
        };

        // Phase 3: terminal sweep fallback
        let mut disposed = 0;
        if !root_terminated || !descendants.is_empty() {
            disposed = self.sweep_terminals(&id, &descendants).await;
        }

        self.clear_tracking(&id);
        self.tracker.unmark_stopping(&id);

        let stopped = root_terminated || any_terminated || disposed > 0;
        if !stopped {
            tracing::warn!(task = %id, "every termination route failed, clearing tracking anyway");
        }
        self.emit_stopped_state(&id);
        self.emit(ViewMessage::TaskEnded {
            task_label: id.clone(),
            exit_code: if stopped { EXIT_STOPPED } else { 0 },
            duration: duration_ms,
            subtasks: direct_children,
        });
        tracing::info!(task = %id, descendants = descendants.len(), disposed, "task stopped");
    }

    /// Stop every running tree, top-most roots first. Used on graceful
    /// daemon shutdown.
    pub async fn stop_all(&self) {
        let mut roots: Vec<TaskId> = self
            .tracker
            .running_tasks()
            .into_iter()
            .map(|id| self.hierarchy.topmost(&id))
            .collect();
        roots.sort();
        roots.dedup();
        for root in roots {
            self.stop_task(root.as_str()).await;
        }
    }

    /// Dispose every terminal whose display name contains (case
    /// insensitively) the short name of the root or any descendant.
    /// Sends a graceful interrupt before disposing. Returns the number
    /// of disposals.
    async fn sweep_terminals(&self, root: &TaskId, descendants: &[TaskId]) -> usize {
        let mut needles: Vec<String> = Vec::with_capacity(descendants.len() + 1);
        needles.push(root.name().to_lowercase());
        needles.extend(descendants.iter().map(|d| d.name().to_lowercase()));

        let mut disposed = 0;
        for terminal in self.terminals.list().await {
            let lowered = terminal.name.to_lowercase();
            if !needles.iter().any(|needle| lowered.contains(needle)) {
                continue;
            }
            if let Err(e) = self.terminals.interrupt(&terminal.name).await {
                tracing::debug!(terminal = %terminal.name, error = %e, "interrupt failed");
            }
            match self.terminals.dispose(&terminal.name).await {
                Ok(()) => disposed += 1,
                Err(e) => {
                    tracing::warn!(terminal = %terminal.name, error = %e, "dispose failed");
                }
            }
        }
        disposed
    }

    fn emit_stopped_state(&self, id: &TaskId) {
        self.emit(ViewMessage::TaskStateChanged {
            task_label: id.clone(),
            state: ReportedState::Stopped,
            can_stop: false,
            can_focus: false,
        });
    }
}
