// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator tests

mod end;
mod ordering;
mod run;
mod start;
mod stop;

use super::*;
use crate::event::{EndEvent, StartEvent};
use ob_adapters::{FakeNotifyAdapter, FakeTaskHost, FakeTerminals};
use ob_core::{FakeClock, ViewMessage};
use ob_storage::{MemoryKvStore, Persistence};
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::mpsc;

type TestOrchestrator = Orchestrator<FakeTaskHost, FakeTerminals, FakeNotifyAdapter, FakeClock>;

/// Test context holding the orchestrator and its fakes
pub(super) struct TestContext {
    orchestrator: Arc<TestOrchestrator>,
    host: FakeTaskHost,
    terminals: FakeTerminals,
    notifier: FakeNotifyAdapter,
    clock: FakeClock,
    view_rx: mpsc::UnboundedReceiver<ViewMessage>,
}

fn setup() -> TestContext {
    let dir = tempdir().unwrap();
    // Keep the temp directory alive by leaking it
    let workspace_root = dir.keep();

    let host = FakeTaskHost::new();
    let terminals = FakeTerminals::new();
    let notifier = FakeNotifyAdapter::new();
    let clock = FakeClock::new();
    let persistence = Arc::new(Persistence::new(
        Arc::new(MemoryKvStore::new()),
        Arc::new(MemoryKvStore::new()),
    ));
    let (view_tx, view_rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(Orchestrator::new(
        EngineDeps {
            host: host.clone(),
            terminals: terminals.clone(),
            notifier: notifier.clone(),
            persistence,
        },
        clock.clone(),
        EngineConfig { workspace_root },
        view_tx,
    ));

    TestContext {
        orchestrator,
        host,
        terminals,
        notifier,
        clock,
        view_rx,
    }
}

impl TestContext {
    /// Drain every message emitted so far
    fn drain(&mut self) -> Vec<ViewMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.view_rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Fire a host start event for a task, registering a live execution
    async fn start(&self, task: &ob_core::HostTask) {
        let handle = self.host.add_active(task.clone());
        self.orchestrator
            .on_task_start(StartEvent::new(task.clone(), handle))
            .await;
    }

    /// Fire a host end event
    async fn end(&self, task: &ob_core::HostTask, exit_code: i32) {
        self.host.complete(&task.id());
        self.orchestrator
            .on_task_end(EndEvent::new(task.clone(), Some(exit_code)))
            .await;
    }
}

/// Message type names in emission order
fn names(messages: &[ViewMessage]) -> Vec<&'static str> {
    messages.iter().map(|m| m.name()).collect()
}

/// Position of the first message matching a predicate
fn position<F: Fn(&ViewMessage) -> bool>(messages: &[ViewMessage], pred: F) -> Option<usize> {
    messages.iter().position(pred)
}
