// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task orchestration engine

mod end;
mod failure;
mod run;
mod start;
mod stop;

use crate::deps::DepsReader;
use crate::hierarchy::Hierarchy;
use crate::resolver;
use crate::tracker::Tracker;
use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{
    Clock, DependsNode, HostTask, ReportedState, TaskId, TaskInfo, TaskState, ViewMessage,
};
use ob_storage::Persistence;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Engine path configuration
pub struct EngineConfig {
    /// Workspace root (location of the workspace config file)
    pub workspace_root: PathBuf,
}

/// Engine adapter dependencies
pub struct EngineDeps<H, T, N> {
    pub host: H,
    pub terminals: T,
    pub notifier: N,
    pub persistence: Arc<Persistence>,
}

/// Orchestrator coordinating host events, view commands, and persistence.
pub struct Orchestrator<H, T, N, C: Clock> {
    pub(crate) host: H,
    pub(crate) terminals: T,
    pub(crate) notifier: N,
    pub(crate) persistence: Arc<Persistence>,
    pub(crate) clock: C,
    pub(crate) reader: DepsReader,
    pub(crate) hierarchy: Hierarchy,
    pub(crate) tracker: Tracker,
    /// Serializes start-event processing end to end. tokio's mutex wakes
    /// waiters in FIFO order, which is exactly the single-consumer queue
    /// the view-ordering guarantees need.
    pub(crate) start_gate: tokio::sync::Mutex<()>,
    view_tx: mpsc::UnboundedSender<ViewMessage>,
}

impl<H, T, N, C> Orchestrator<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    /// Create a new orchestrator
    pub fn new(
        deps: EngineDeps<H, T, N>,
        clock: C,
        config: EngineConfig,
        view_tx: mpsc::UnboundedSender<ViewMessage>,
    ) -> Self {
        Self {
            host: deps.host,
            terminals: deps.terminals,
            notifier: deps.notifier,
            persistence: deps.persistence,
            clock,
            reader: DepsReader::new(config.workspace_root),
            hierarchy: Hierarchy::new(),
            tracker: Tracker::new(),
            start_gate: tokio::sync::Mutex::new(()),
            view_tx,
        }
    }

    /// Persistence handle (shared with the dispatcher)
    pub fn persistence(&self) -> Arc<Persistence> {
        Arc::clone(&self.persistence)
    }

    /// Fire-and-forget message emission to the view.
    pub(crate) fn emit(&self, msg: ViewMessage) {
        tracing::debug!(message = %msg.log_summary(), "emit");
        if self.view_tx.send(msg).is_err() {
            tracing::debug!("view channel closed, dropping message");
        }
    }

    /// Emit on behalf of a collaborator (the command dispatcher's
    /// read-only replies share the engine's outbound stream).
    pub fn emit_message(&self, msg: ViewMessage) {
        self.emit(msg);
    }

    /// Enumerate host tasks, degrading to empty on failure.
    pub(crate) async fn fetch_tasks_or_empty(&self) -> Vec<HostTask> {
        match self.host.fetch_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                let error = crate::EngineError::Host(e);
                tracing::warn!(error = %error, "fetchTasks failed, proceeding with empty task list");
                Vec::new()
            }
        }
    }

    /// Drop every piece of live bookkeeping for one task.
    pub(crate) fn clear_tracking(&self, id: &TaskId) {
        self.tracker.clear_tracking(id);
        self.hierarchy.remove_parent_key(id);
    }

    // --- view queries ---

    /// Resolve a user-supplied label to a host task.
    pub async fn find_task(&self, arg: &str) -> Result<HostTask, crate::EngineError> {
        let all_tasks = self.fetch_tasks_or_empty().await;
        resolver::resolve(&all_tasks, arg)
            .cloned()
            .ok_or_else(|| crate::EngineError::NotFound(arg.to_string()))
    }

    /// Build the `updateTasks` payload with resolved dependency trees.
    pub async fn task_infos(&self) -> Vec<TaskInfo> {
        let all_tasks = self.fetch_tasks_or_empty().await;
        all_tasks
            .iter()
            .map(|task| {
                let mut visited = HashSet::new();
                visited.insert(task.id());
                let deps = self.reader.read(task);
                TaskInfo {
                    id: task.id(),
                    label: task.name.clone(),
                    display_label: task.display_label(),
                    source: task.source.clone(),
                    definition: task.definition_path.clone(),
                    depends_on: self.build_depends_tree(&deps.deps, &all_tasks, &mut visited),
                    depends_order: deps.order,
                }
            })
            .collect()
    }

    fn build_depends_tree(
        &self,
        dep_names: &[String],
        all_tasks: &[HostTask],
        visited: &mut HashSet<TaskId>,
    ) -> Vec<DependsNode> {
        let mut nodes = Vec::new();
        for name in dep_names {
            let Some(task) = resolver::find_by_name(all_tasks, name) else {
                continue;
            };
            let id = task.id();
            if !visited.insert(id.clone()) {
                // Cycle: show the node, stop descending
                nodes.push(DependsNode {
                    id,
                    label: task.display_label(),
                    depends_on: Vec::new(),
                    depends_order: Default::default(),
                });
                continue;
            }
            let deps = self.reader.read(task);
            nodes.push(DependsNode {
                id,
                label: task.display_label(),
                depends_on: self.build_depends_tree(&deps.deps, all_tasks, visited),
                depends_order: deps.order,
            });
        }
        nodes
    }

    /// Host task list serialized for the operator's clipboard.
    pub async fn tasks_json(&self) -> String {
        let tasks = self.fetch_tasks_or_empty().await;
        serde_json::to_string_pretty(&tasks).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "task list serialization failed");
            "[]".to_string()
        })
    }

    /// Reveal the terminal a task runs in, or warn the operator.
    pub async fn focus_terminal(&self, arg: &str) {
        let all_tasks = self.fetch_tasks_or_empty().await;
        let short = resolver::resolve(&all_tasks, arg)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| TaskId::new(arg).name().to_string());
        let needle = short.to_lowercase();

        for terminal in self.terminals.list().await {
            if terminal.name.to_lowercase().contains(&needle) {
                match self.terminals.reveal(&terminal.name).await {
                    Ok(()) => return,
                    Err(e) => {
                        tracing::warn!(terminal = %terminal.name, error = %e, "reveal failed");
                    }
                }
            }
        }

        let _ = self
            .notifier
            .warn(&format!("No terminal found for task '{short}'"))
            .await;
    }

    // --- reconnect replay ---

    /// Re-emit running and persisted-completed state for a fresh view.
    ///
    /// Parents are replayed before their children so the view builds
    /// groups in the same order as live starts.
    pub async fn replay_state(&self) {
        let mut running = self.tracker.running_tasks();
        running.sort_by_key(|id| self.hierarchy.ancestors(id).len());

        for id in running {
            let Some((_, start_epoch)) = self.tracker.start_time(&id) else {
                continue;
            };
            let history = self.persistence.task_history(&id).await;
            let parent = self.hierarchy.find_parent_like(&id);
            if let Some(parent_id) = &parent {
                let parent_start = self
                    .tracker
                    .start_time(parent_id)
                    .map(|(_, e)| e)
                    .unwrap_or(start_epoch);
                self.emit(ViewMessage::SubtaskStarted {
                    parent: parent_id.clone(),
                    child: id.clone(),
                    parent_start_time: parent_start,
                });
            }
            self.emit(ViewMessage::TaskStarted {
                task_label: id.clone(),
                start_time: start_epoch,
                avg_duration: history.average(),
                is_first_run: history.count == 0,
                subtasks: self.hierarchy.children(&id),
                state: ReportedState::Running,
                is_dependency_proxy: !self.tracker.has_execution(&id),
                parent_task: parent,
            });
        }

        for (id, result) in self.persistence.completed_tasks().await {
            // A record for a currently-running task is stale bookkeeping;
            // live state wins.
            if self.tracker.state(&id) == Some(TaskState::Running) {
                continue;
            }
            self.emit(ViewMessage::TaskCompleted {
                task_label: id,
                exit_code: result.exit_code,
                failed: result.failed,
                reason: result.reason,
                failed_dependency: result.failed_dependency,
                duration: result.duration_ms,
                subtasks: result.subtasks,
                parent_task: result.parent_task,
            });
        }
    }

    /// Delete a completion record and, transitively, its descendants'.
    pub async fn dismiss_task(&self, arg: &str) {
        let completed = self.persistence.completed_tasks().await;
        let root = TaskId::new(arg);
        let mut to_clear = Vec::new();
        let mut stack = vec![root.clone()];
        let mut visited = HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(result) = completed.get(&id) {
                stack.extend(result.subtasks.iter().cloned());
            }
            to_clear.push(id);
        }
        self.persistence.clear_completed_tasks(&to_clear).await;
        for id in &to_clear {
            self.tracker.clear_result(id);
        }
        self.emit(ViewMessage::DismissTaskGroup { label: root });
    }
}

#[cfg(test)]
#[path = "../orchestrator_tests/mod.rs"]
mod tests;
