// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound command dispatch
//!
//! Maps every view command onto the engine, navigation history, and
//! persistence. Nothing thrown in a handler escapes: each arm logs its
//! failures and answers only through the outbound message vocabulary.

use crate::docs::{DocLoader, DEFAULT_DOCUMENT};
use crate::logbuf::LogBuffer;
use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{Clock, Command, ViewMessage};
use ob_engine::Orchestrator;
use parking_lot::Mutex;
use std::sync::Arc;

/// Dispatches view commands to the engine and its periphery.
pub struct Dispatcher<H, T, N, C: Clock> {
    orchestrator: Arc<Orchestrator<H, T, N, C>>,
    nav: Mutex<crate::nav::Navigation>,
    docs: DocLoader,
    logbuf: LogBuffer,
}

impl<H, T, N, C> Dispatcher<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(
        orchestrator: Arc<Orchestrator<H, T, N, C>>,
        docs: DocLoader,
        logbuf: LogBuffer,
    ) -> Self {
        Self {
            orchestrator,
            nav: Mutex::new(crate::nav::Navigation::new()),
            docs,
            logbuf,
        }
    }

    /// Handle one inbound command.
    pub async fn handle(&self, command: Command) {
        tracing::debug!(command = %command.log_summary(), "dispatch");
        match command {
            Command::Ready => self.handle_ready().await,
            Command::Navigate { file } => self.navigate_to(&file, true).await,
            Command::NavigateBack => {
                let target = self.nav.lock().back().map(|f| f.to_string());
                if let Some(file) = target {
                    self.navigate_to(&file, false).await;
                }
            }
            Command::NavigateForward => {
                let target = self.nav.lock().forward().map(|f| f.to_string());
                if let Some(file) = target {
                    self.navigate_to(&file, false).await;
                }
            }
            Command::NavigateToHistoryItem { index } => {
                let target = self.nav.lock().jump(index).map(|f| f.to_string());
                if let Some(file) = target {
                    self.navigate_to(&file, false).await;
                }
            }
            Command::RunTask { label } => self.orchestrator.run_task(&label).await,
            Command::StopTask { label } => self.orchestrator.stop_task(&label).await,
            Command::FocusTerminal { label } => self.orchestrator.focus_terminal(&label).await,
            Command::OpenTaskDefinition { label } => self.open_task_definition(&label).await,
            Command::ToggleStar { label } => {
                let starred = self
                    .orchestrator
                    .persistence()
                    .toggle_star(&ob_core::TaskId::new(label))
                    .await;
                self.emit(ViewMessage::UpdateStarred { tasks: starred });
            }
            Command::DismissTask { label } => self.orchestrator.dismiss_task(&label).await,
            Command::GetTaskLists => {
                let tasks = self.orchestrator.task_infos().await;
                self.emit(ViewMessage::UpdateTasks { tasks });
            }
            Command::GetPanelState => {
                let state = self.orchestrator.persistence().panel_state().await;
                self.emit(ViewMessage::PanelState { state });
            }
            Command::GetLogBuffer => {
                self.emit(ViewMessage::LogBuffer {
                    lines: self.logbuf.lines(),
                });
            }
            Command::GetExecutionHistory => {
                let records = self.orchestrator.persistence().execution_history().await;
                self.emit(ViewMessage::ExecutionHistory { records });
            }
            Command::SetPanelState { update } => {
                let state = self
                    .orchestrator
                    .persistence()
                    .update_panel_state(&update)
                    .await;
                self.emit(ViewMessage::PanelState { state });
            }
            Command::CopyTasksJson => {
                let json = self.orchestrator.tasks_json().await;
                self.emit(ViewMessage::TasksJson { json });
            }
            Command::Unknown => {
                tracing::debug!("unknown command type, ignoring");
            }
        }
    }

    /// Full replay for a freshly-connected view.
    async fn handle_ready(&self) {
        let persistence = self.orchestrator.persistence();

        let tasks = self.orchestrator.task_infos().await;
        self.emit(ViewMessage::UpdateTasks { tasks });

        // Restore navigation and show the current (or default) document
        let (entries, index) = persistence.navigation().await;
        let restored = crate::nav::Navigation::restore(entries, index);
        let current = restored
            .current()
            .unwrap_or(DEFAULT_DOCUMENT)
            .to_string();
        *self.nav.lock() = restored;
        self.emit_nav();
        self.load_document(&current);

        self.emit(ViewMessage::UpdateRecentlyUsed {
            tasks: persistence.recently_used().await,
        });
        self.emit(ViewMessage::UpdateStarred {
            tasks: persistence.starred().await,
        });
        self.emit(ViewMessage::PanelState {
            state: persistence.panel_state().await,
        });

        self.orchestrator.replay_state().await;
    }

    /// Load a document and optionally push it onto the history.
    async fn navigate_to(&self, file: &str, push: bool) {
        if push {
            self.nav.lock().push(file);
        }
        let (entries, index) = {
            let nav = self.nav.lock();
            (nav.entries().to_vec(), nav.index())
        };
        self.orchestrator
            .persistence()
            .save_navigation(&entries, index)
            .await;
        self.emit_nav();
        self.load_document(file);
    }

    fn load_document(&self, file: &str) {
        match self.docs.load(file) {
            Ok(content) => self.emit(ViewMessage::LoadMdx {
                file: file.to_string(),
                content,
            }),
            Err(e) => {
                tracing::warn!(file, error = %e, "document load failed");
                self.emit(ViewMessage::Error {
                    message: format!("Failed to load '{file}': {e}"),
                });
            }
        }
    }

    fn emit_nav(&self) {
        let nav = self.nav.lock();
        self.emit(ViewMessage::UpdateNavigationHistory {
            entries: nav.entries().to_vec(),
            index: nav.index(),
        });
    }

    fn emit(&self, msg: ViewMessage) {
        self.orchestrator.emit_message(msg);
    }

    /// Open the file a task is defined in, best-effort seeking to the
    /// line that mentions its label.
    async fn open_task_definition(&self, label: &str) {
        let task = match self.orchestrator.find_task(label).await {
            Ok(task) => task,
            Err(e) => {
                self.emit(ViewMessage::Error {
                    message: e.to_string(),
                });
                return;
            }
        };
        let Some(path) = task.definition_path.clone() else {
            tracing::debug!(task = %task.id(), "no definition path recorded");
            self.emit(ViewMessage::Error {
                message: format!("No definition file known for '{}'", task.display_label()),
            });
            return;
        };

        let line = find_definition_line(&path, &task.name).unwrap_or(1);
        let Some(editor) = crate::env::editor() else {
            tracing::warn!("no editor configured, cannot open definition");
            self.emit(ViewMessage::Error {
                message: "No editor configured (set OPSBOARD_EDITOR)".to_string(),
            });
            return;
        };

        // `code`-style editors take file:line, classic ones take +line
        let mut cmd = tokio::process::Command::new(&editor);
        if editor.contains("code") {
            cmd.arg("-g").arg(format!("{}:{line}", path.display()));
        } else {
            cmd.arg(format!("+{line}")).arg(&path);
        }
        if let Err(e) = cmd.spawn() {
            tracing::warn!(editor, error = %e, "failed to launch editor");
        }
    }
}

/// 1-based line of the first occurrence of the quoted label, if any.
fn find_definition_line(path: &std::path::Path, label: &str) -> Option<usize> {
    let content = std::fs::read_to_string(path).ok()?;
    let needle = format!("\"{label}\"");
    content
        .lines()
        .position(|line| line.contains(&needle))
        .map(|pos| pos + 1)
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
