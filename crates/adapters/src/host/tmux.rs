// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux-backed task host
//!
//! Each execution runs inside a detached tmux session named
//! `ob-<task>-<suffix>`. Termination kills the session; the terminal
//! adapter's sweep covers sessions this kill leaks (shell tasks that
//! spawn child shells).

use super::{ActiveExecution, ExecutionHandle, HostError, TaskHost};
use async_trait::async_trait;
use ob_core::{HostTask, IdGen, ShortId, TaskId, TaskSource, UuidIdGen, WorkspaceTasksFile};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;

/// Tmux-based task host rooted at a workspace directory.
#[derive(Clone)]
pub struct TmuxHost {
    workspace_root: PathBuf,
    ids: UuidIdGen,
    /// Sessions this host spawned, by session name
    spawned: Arc<Mutex<HashMap<String, HostTask>>>,
}

struct TmuxExecution {
    task: TaskId,
    session: String,
}

impl TmuxHost {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            ids: UuidIdGen,
            spawned: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn tasks_file(&self) -> PathBuf {
        self.workspace_root.join(ob_core::WORKSPACE_TASKS_FILE)
    }

    fn package_manifest(&self) -> PathBuf {
        self.workspace_root.join("package.json")
    }

    /// Tasks defined in the workspace config file.
    fn workspace_tasks(&self) -> Vec<HostTask> {
        let path = self.tasks_file();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        let file = match WorkspaceTasksFile::parse(&content) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "workspace tasks file unreadable");
                return Vec::new();
            }
        };
        file.tasks
            .iter()
            .map(|def| {
                let mut task = HostTask::new(TaskSource::Workspace, &def.label);
                task.definition_path = Some(path.clone());
                task.detail = def.command.clone();
                task
            })
            .collect()
    }

    /// Package-manifest scripts exposed as npm tasks.
    fn npm_tasks(&self) -> Vec<HostTask> {
        let path = self.package_manifest();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        let manifest: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "package manifest unreadable");
                return Vec::new();
            }
        };
        let Some(scripts) = manifest.get("scripts").and_then(|s| s.as_object()) else {
            return Vec::new();
        };
        scripts
            .iter()
            .map(|(name, cmd)| {
                let mut task = HostTask::new(TaskSource::Npm, name);
                task.definition_path = Some(path.clone());
                task.detail = cmd.as_str().map(|c| c.to_string());
                task
            })
            .collect()
    }

    /// Shell command line for a task.
    fn command_line(&self, task: &HostTask) -> String {
        match task.source {
            TaskSource::Npm => format!("npm run {}", task.name),
            _ => task
                .detail
                .clone()
                .unwrap_or_else(|| task.name.clone()),
        }
    }

    async fn session_alive(session: &str) -> bool {
        Command::new("tmux")
            .args(["has-session", "-t", session])
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl ExecutionHandle for TmuxExecution {
    fn task_id(&self) -> TaskId {
        self.task.clone()
    }

    async fn terminate(&self) -> Result<(), HostError> {
        let output = Command::new("tmux")
            .args(["kill-session", "-t", &self.session])
            .output()
            .await
            .map_err(|e| HostError::TerminateFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HostError::TerminateFailed(stderr.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskHost for TmuxHost {
    async fn fetch_tasks(&self) -> Result<Vec<HostTask>, HostError> {
        let mut tasks = self.workspace_tasks();
        tasks.extend(self.npm_tasks());
        Ok(tasks)
    }

    async fn execute_task(&self, task: &HostTask) -> Result<Arc<dyn ExecutionHandle>, HostError> {
        if !self.workspace_root.exists() {
            return Err(HostError::ExecuteFailed(format!(
                "workspace root does not exist: {}",
                self.workspace_root.display()
            )));
        }

        let session = format!("ob-{}-{}", task.name, self.ids.next().short(8));
        let command = self.command_line(task);

        let output = Command::new("tmux")
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(&session)
            .arg("-c")
            .arg(&self.workspace_root)
            .arg(&command)
            .output()
            .await
            .map_err(|e| HostError::ExecuteFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session, stderr = %stderr, "tmux spawn failed");
            return Err(HostError::ExecuteFailed(stderr.to_string()));
        }

        self.spawned.lock().insert(session.clone(), task.clone());

        Ok(Arc::new(TmuxExecution {
            task: task.id(),
            session,
        }))
    }

    async fn active_executions(&self) -> Vec<ActiveExecution> {
        let spawned: Vec<(String, HostTask)> = self
            .spawned
            .lock()
            .iter()
            .map(|(session, task)| (session.clone(), task.clone()))
            .collect();

        let mut active = Vec::new();
        for (session, task) in spawned {
            if Self::session_alive(&session).await {
                active.push(ActiveExecution {
                    handle: Arc::new(TmuxExecution {
                        task: task.id(),
                        session,
                    }),
                    task,
                });
            } else {
                self.spawned.lock().remove(&session);
            }
        }
        active
    }
}
