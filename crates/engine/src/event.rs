// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host lifecycle events as the engine consumes them

use ob_adapters::ExecutionHandle;
use ob_core::HostTask;
use std::sync::Arc;

/// A host "task started" event.
#[derive(Clone)]
pub struct StartEvent {
    pub task: HostTask,
    /// Handle for the new execution; absent when the host didn't provide one
    pub handle: Option<Arc<dyn ExecutionHandle>>,
}

impl StartEvent {
    pub fn new(task: HostTask, handle: Arc<dyn ExecutionHandle>) -> Self {
        Self {
            task,
            handle: Some(handle),
        }
    }

    /// Start event the host reported without an execution handle.
    pub fn without_handle(task: HostTask) -> Self {
        Self { task, handle: None }
    }
}

impl std::fmt::Debug for StartEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartEvent")
            .field("task", &self.task.id())
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}

/// A host "task ended" event.
#[derive(Debug, Clone)]
pub struct EndEvent {
    pub task: HostTask,
    /// Exit code; hosts omit it for some task kinds (treated as 0)
    pub exit_code: Option<i32>,
}

impl EndEvent {
    pub fn new(task: HostTask, exit_code: Option<i32>) -> Self {
        Self { task, exit_code }
    }
}
