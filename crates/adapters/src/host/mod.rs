// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host task-runtime adapters
//!
//! The host enumerates tasks, executes them, and hands back per-execution
//! handles whose `terminate()` is documented but not reliable across all
//! task sources. The engine therefore treats termination as best-effort
//! and keeps a terminal-sweep backstop (see the terminal adapter).

mod tmux;

pub use tmux::TmuxHost;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeExecution, FakeTaskHost, HostCall};

use async_trait::async_trait;
use ob_core::{HostTask, TaskId};
use std::sync::Arc;
use thiserror::Error;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("execute failed: {0}")]
    ExecuteFailed(String),
    #[error("terminate failed: {0}")]
    TerminateFailed(String),
    #[error("host call failed: {0}")]
    CallFailed(String),
}

/// Handle to one live task execution.
///
/// Held as `Arc<dyn ExecutionHandle>` because the host owns the concrete
/// type; proxy parents have no handle at all.
#[async_trait]
pub trait ExecutionHandle: Send + Sync {
    /// Task this execution belongs to
    fn task_id(&self) -> TaskId;

    /// Ask the host to terminate this execution
    async fn terminate(&self) -> Result<(), HostError>;
}

/// An execution the host currently believes is live.
#[derive(Clone)]
pub struct ActiveExecution {
    pub task: HostTask,
    pub handle: Arc<dyn ExecutionHandle>,
}

impl std::fmt::Debug for ActiveExecution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveExecution")
            .field("task", &self.task.id())
            .finish()
    }
}

/// Adapter for the host task runtime
#[async_trait]
pub trait TaskHost: Clone + Send + Sync + 'static {
    /// Enumerate the tasks the host can run. Order is unspecified.
    async fn fetch_tasks(&self) -> Result<Vec<HostTask>, HostError>;

    /// Start a task, returning its execution handle
    async fn execute_task(&self, task: &HostTask) -> Result<Arc<dyn ExecutionHandle>, HostError>;

    /// Executions the host currently believes are live
    async fn active_executions(&self) -> Vec<ActiveExecution>;
}
