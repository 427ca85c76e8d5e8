// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake task host for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ActiveExecution, ExecutionHandle, HostError, TaskHost};
use async_trait::async_trait;
use ob_core::{HostTask, TaskId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Recorded host call
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    FetchTasks,
    Execute { task: TaskId },
    Terminate { task: TaskId },
}

struct FakeHostState {
    tasks: Vec<HostTask>,
    active: Vec<ActiveExecution>,
    calls: Vec<HostCall>,
    fail_terminate: HashSet<TaskId>,
    fail_execute: HashSet<TaskId>,
}

/// Fake execution handle recording terminate calls on the shared host state.
pub struct FakeExecution {
    task: TaskId,
    host: Arc<Mutex<FakeHostState>>,
}

#[async_trait]
impl ExecutionHandle for FakeExecution {
    fn task_id(&self) -> TaskId {
        self.task.clone()
    }

    async fn terminate(&self) -> Result<(), HostError> {
        let mut inner = self.host.lock();
        inner.calls.push(HostCall::Terminate {
            task: self.task.clone(),
        });
        if inner.fail_terminate.contains(&self.task) {
            return Err(HostError::TerminateFailed(format!(
                "terminate rejected for {}",
                self.task
            )));
        }
        inner.active.retain(|a| a.task.id() != self.task);
        Ok(())
    }
}

/// Fake task host for testing
#[derive(Clone)]
pub struct FakeTaskHost {
    inner: Arc<Mutex<FakeHostState>>,
}

impl Default for FakeTaskHost {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeHostState {
                tasks: Vec::new(),
                active: Vec::new(),
                calls: Vec::new(),
                fail_terminate: HashSet::new(),
                fail_execute: HashSet::new(),
            })),
        }
    }
}

impl FakeTaskHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the enumerable task list
    pub fn set_tasks(&self, tasks: Vec<HostTask>) {
        self.inner.lock().tasks = tasks;
    }

    /// Append one enumerable task
    pub fn push_task(&self, task: HostTask) {
        self.inner.lock().tasks.push(task);
    }

    /// Build a handle without registering it as an active execution
    pub fn handle_for(&self, task: &HostTask) -> Arc<FakeExecution> {
        Arc::new(FakeExecution {
            task: task.id(),
            host: Arc::clone(&self.inner),
        })
    }

    /// Register an already-live execution (as if started outside the engine)
    pub fn add_active(&self, task: HostTask) -> Arc<FakeExecution> {
        let handle = Arc::new(FakeExecution {
            task: task.id(),
            host: Arc::clone(&self.inner),
        });
        self.inner.lock().active.push(ActiveExecution {
            task,
            handle: Arc::clone(&handle) as Arc<dyn ExecutionHandle>,
        });
        handle
    }

    /// Drop an execution from the active list (host saw it finish)
    pub fn complete(&self, task: &TaskId) {
        self.inner.lock().active.retain(|a| a.task.id() != *task);
    }

    /// Make `terminate()` fail for this task from now on
    pub fn fail_terminate(&self, task: &TaskId) {
        self.inner.lock().fail_terminate.insert(task.clone());
    }

    /// Make `execute_task()` fail for this task from now on
    pub fn fail_execute(&self, task: &TaskId) {
        self.inner.lock().fail_execute.insert(task.clone());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<HostCall> {
        self.inner.lock().calls.clone()
    }

    /// How many times `terminate()` was called for this task
    pub fn terminate_count(&self, task: &TaskId) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, HostCall::Terminate { task: t } if t == task))
            .count()
    }

    /// Whether `terminate()` was ever called for this task
    pub fn terminated(&self, task: &TaskId) -> bool {
        self.terminate_count(task) > 0
    }
}

#[async_trait]
impl TaskHost for FakeTaskHost {
    async fn fetch_tasks(&self) -> Result<Vec<HostTask>, HostError> {
        let mut inner = self.inner.lock();
        inner.calls.push(HostCall::FetchTasks);
        Ok(inner.tasks.clone())
    }

    async fn execute_task(&self, task: &HostTask) -> Result<Arc<dyn ExecutionHandle>, HostError> {
        let handle = {
            let mut inner = self.inner.lock();
            inner.calls.push(HostCall::Execute { task: task.id() });
            if inner.fail_execute.contains(&task.id()) {
                return Err(HostError::ExecuteFailed(format!(
                    "execute rejected for {}",
                    task.id()
                )));
            }
            let handle = Arc::new(FakeExecution {
                task: task.id(),
                host: Arc::clone(&self.inner),
            });
            inner.active.push(ActiveExecution {
                task: task.clone(),
                handle: Arc::clone(&handle) as Arc<dyn ExecutionHandle>,
            });
            handle
        };
        Ok(handle)
    }

    async fn active_executions(&self) -> Vec<ActiveExecution> {
        self.inner.lock().active.clone()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
