// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level end-to-end scenarios.
//!
//! These drive the full stack (orchestrator, persistence, dispatcher,
//! wire protocol) against fake adapters and assert the externally
//! observable contract: the outbound message stream and the persisted
//! stores.

use ob_adapters::{FakeNotifyAdapter, FakeTaskHost, FakeTerminals};
use ob_core::test_support::{task_with_deps, workspace_task};
use ob_core::{
    Command, FakeClock, HostTask, ReportedState, TaskId, ViewMessage, EXIT_DEPENDENCY_FAILED,
    EXIT_STOPPED,
};
use ob_engine::{EndEvent, EngineConfig, EngineDeps, Orchestrator, StartEvent};
use ob_storage::{MemoryKvStore, Persistence, TASK_HISTORY_WINDOW};
use similar_asserts::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::mpsc;

type TestOrchestrator = Orchestrator<FakeTaskHost, FakeTerminals, FakeNotifyAdapter, FakeClock>;

struct Stack {
    orchestrator: Arc<TestOrchestrator>,
    host: FakeTaskHost,
    terminals: FakeTerminals,
    clock: FakeClock,
    workspace_store: Arc<MemoryKvStore>,
    view_rx: mpsc::UnboundedReceiver<ViewMessage>,
}

fn stack() -> Stack {
    let dir = tempdir().unwrap();
    let workspace_root = dir.keep();

    let host = FakeTaskHost::new();
    let terminals = FakeTerminals::new();
    let clock = FakeClock::new();
    let workspace_store = Arc::new(MemoryKvStore::new());
    let persistence = Arc::new(Persistence::new(
        Arc::new(MemoryKvStore::new()),
        workspace_store.clone(),
    ));
    let (view_tx, view_rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(Orchestrator::new(
        EngineDeps {
            host: host.clone(),
            terminals: terminals.clone(),
            notifier: FakeNotifyAdapter::new(),
            persistence,
        },
        clock.clone(),
        EngineConfig { workspace_root },
        view_tx,
    ));

    Stack {
        orchestrator,
        host,
        terminals,
        clock,
        workspace_store,
        view_rx,
    }
}

impl Stack {
    fn drain(&mut self) -> Vec<ViewMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.view_rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    async fn start(&self, task: &HostTask) {
        let handle = self.host.add_active(task.clone());
        self.orchestrator
            .on_task_start(StartEvent::new(task.clone(), handle))
            .await;
    }

    async fn end(&self, task: &HostTask, exit_code: i32) {
        self.host.complete(&task.id());
        self.orchestrator
            .on_task_end(EndEvent::new(task.clone(), Some(exit_code)))
            .await;
    }
}

fn find_completed(messages: &[ViewMessage], id: &TaskId) -> Option<ViewMessage> {
    messages
        .iter()
        .find(|m| matches!(m, ViewMessage::TaskCompleted { task_label, .. } if task_label == id))
        .cloned()
}

// --- Scenario 1: dependency failure propagation ---

#[tokio::test]
async fn dependency_failure_propagation() {
    let mut stack = stack();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    stack.host.set_tasks(vec![parent.clone(), child.clone()]);

    stack.start(&parent).await;
    stack.start(&child).await;
    stack.drain();
    stack.end(&child, 1).await;

    let messages = stack.drain();
    match find_completed(&messages, &parent.id()) {
        Some(ViewMessage::TaskCompleted {
            exit_code,
            failed,
            reason,
            failed_dependency,
            ..
        }) => {
            assert_eq!(exit_code, EXIT_DEPENDENCY_FAILED);
            assert!(failed);
            assert_eq!(
                reason.as_deref(),
                Some("Dependency failed: child (exit code 1)")
            );
            assert_eq!(failed_dependency, Some(child.id()));
        }
        other => panic!("expected parent taskCompleted, got {other:?}"),
    }

    // Persisted, and the parent's execution observed terminate()
    let completed = stack.orchestrator.persistence().completed_tasks().await;
    assert_eq!(completed[&parent.id()].exit_code, EXIT_DEPENDENCY_FAILED);
    assert!(stack.host.terminated(&parent.id()));
}

// --- Scenario 2: proxy-parent ordering ---

#[tokio::test]
async fn proxy_parent_ordering() {
    let mut stack = stack();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    stack.host.set_tasks(vec![parent.clone(), child.clone()]);
    stack.host.add_active(parent.clone());

    stack.start(&child).await;
    let messages = stack.drain();

    let proxy_starts: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter_map(|(i, m)| match m {
            ViewMessage::TaskStarted {
                task_label,
                is_dependency_proxy: true,
                ..
            } if *task_label == parent.id() => Some(i),
            _ => None,
        })
        .collect();
    assert_eq!(proxy_starts.len(), 1, "exactly one proxy taskStarted");

    let edge = messages
        .iter()
        .position(|m| {
            matches!(m, ViewMessage::SubtaskStarted { parent: p, child: c, .. }
                if *p == parent.id() && *c == child.id())
        })
        .expect("subtaskStarted edge");
    let child_start = messages
        .iter()
        .position(|m| {
            matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == child.id())
        })
        .expect("child taskStarted");

    assert!(proxy_starts[0] < edge);
    assert!(edge < child_start);
}

// --- Scenario 3: rerun group-clear ---

#[tokio::test]
async fn rerun_clears_persisted_group() {
    let mut stack = stack();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    stack.host.set_tasks(vec![parent.clone(), child.clone()]);

    stack.start(&parent).await;
    stack.start(&child).await;
    stack.end(&child, 1).await;
    stack.drain();

    let completed = stack.orchestrator.persistence().completed_tasks().await;
    assert!(completed.contains_key(&parent.id()));
    assert!(completed.contains_key(&child.id()));

    stack.orchestrator.run_task("child").await;
    let messages = stack.drain();

    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::DismissTaskGroup { label } if *label == parent.id())));
    let completed = stack.orchestrator.persistence().completed_tasks().await;
    assert!(!completed.contains_key(&parent.id()));
    assert!(!completed.contains_key(&child.id()));
}

// --- Scenario 4: stop protocol with descendants ---

#[tokio::test]
async fn stop_protocol_with_descendants() {
    let mut stack = stack();
    let root = task_with_deps("root", &["a", "b"]);
    let a = workspace_task("a");
    let b = workspace_task("b");
    stack.host.set_tasks(vec![root.clone(), a.clone(), b.clone()]);
    stack.terminals.add("Task - root");

    stack.start(&root).await;
    stack.start(&a).await;
    stack.start(&b).await;
    stack.drain();

    stack.orchestrator.stop_task("root").await;
    let messages = stack.drain();

    for descendant in [&a, &b] {
        assert!(
            messages.iter().any(|m| matches!(m,
                ViewMessage::TaskEnded { task_label, exit_code, .. }
                    if *task_label == descendant.id() && *exit_code == EXIT_STOPPED)),
            "missing synthetic end for {}",
            descendant.id()
        );
    }

    let stopping = messages
        .iter()
        .position(|m| {
            matches!(m, ViewMessage::TaskStateChanged { task_label, state, .. }
                if *task_label == root.id() && *state == ReportedState::Stopping)
        })
        .expect("stopping");
    let stopped = messages
        .iter()
        .position(|m| {
            matches!(m, ViewMessage::TaskStateChanged { task_label, state, .. }
                if *task_label == root.id() && *state == ReportedState::Stopped)
        })
        .expect("stopped");
    let ended = messages
        .iter()
        .position(|m| {
            matches!(m, ViewMessage::TaskEnded { task_label, .. } if *task_label == root.id())
        })
        .expect("root end");
    assert!(stopping < stopped && stopped < ended);

    // Sweep disposed the terminal named after the root
    assert_eq!(stack.terminals.disposed(), vec!["Task - root"]);
}

// --- Scenario 5: persistence read-modify-write under contention ---

#[tokio::test]
async fn concurrent_task_history_updates() {
    let stack = stack();
    let persistence = stack.orchestrator.persistence();
    let task = TaskId::new("workspace|t");

    let mut handles = Vec::new();
    for duration in 1..=20u64 {
        let persistence = Arc::clone(&persistence);
        let task = task.clone();
        handles.push(tokio::spawn(async move {
            persistence.update_task_history(&task, duration).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let history = persistence.task_history(&task).await;
    assert_eq!(history.count, 20);
    assert_eq!(history.durations.len(), TASK_HISTORY_WINDOW);
    assert_eq!(history.durations, (11..=20).collect::<Vec<u64>>());
}

// --- Scenario 6: cancellation silences late events ---

#[tokio::test]
async fn cancellation_silences_late_start() {
    let mut stack = stack();
    let build = workspace_task("build");
    stack.host.set_tasks(vec![build.clone()]);

    stack.start(&build).await;
    stack.drain();
    stack.orchestrator.stop_task("build").await;
    stack.drain();

    // The host echoes a late start for the stopped task
    stack.start(&build).await;
    let messages = stack.drain();
    assert!(
        !messages
            .iter()
            .any(|m| matches!(m, ViewMessage::TaskStarted { .. })),
        "late start must be silenced"
    );

    // That one event consumed the marker: a fresh start goes through
    stack.start(&build).await;
    let messages = stack.drain();
    assert!(messages
        .iter()
        .any(|m| matches!(m, ViewMessage::TaskStarted { .. })));
}

// --- Legacy migration through the whole stack ---

#[tokio::test]
async fn legacy_failed_tasks_migrate_on_first_read() {
    let stack = stack();
    let old = TaskId::new("workspace|old");
    let result = ob_core::TaskResult::from_exit(1, 5, 5, vec![], None);
    let legacy: std::collections::HashMap<TaskId, ob_core::TaskResult> =
        [(old.clone(), result.clone())].into_iter().collect();
    stack
        .workspace_store
        .seed("failedTasks", serde_json::to_value(&legacy).unwrap());

    let completed = stack.orchestrator.persistence().completed_tasks().await;
    assert_eq!(completed.get(&old), Some(&result));
    assert!(stack.workspace_store.dump().get("failedTasks").is_none());
}

// --- Full wire: view connects over the unix socket ---

#[tokio::test]
async fn view_handshake_and_ready_over_socket() {
    use ob_daemon::docs::DocLoader;
    use ob_daemon::{wire, Dispatcher, ListenCtx, Listener, LogBuffer, Request, Response};
    use tokio::io::AsyncWriteExt as _;

    let dir = tempdir().unwrap();
    let workspace_root = dir.keep();
    let docs_root = workspace_root.join("docs");
    std::fs::create_dir_all(&docs_root).unwrap();
    std::fs::write(docs_root.join("index.mdx"), "# Opsboard").unwrap();

    let host = FakeTaskHost::new();
    host.set_tasks(vec![workspace_task("build")]);
    let (view_tx, view_rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(Orchestrator::new(
        EngineDeps {
            host: host.clone(),
            terminals: FakeTerminals::new(),
            notifier: FakeNotifyAdapter::new(),
            persistence: Arc::new(Persistence::new(
                Arc::new(MemoryKvStore::new()),
                Arc::new(MemoryKvStore::new()),
            )),
        },
        FakeClock::new(),
        EngineConfig {
            workspace_root: workspace_root.clone(),
        },
        view_tx,
    ));
    let dispatcher = Dispatcher::new(
        Arc::clone(&orchestrator),
        DocLoader::new(docs_root),
        LogBuffer::new(),
    );
    let ctx = Arc::new(ListenCtx::new(
        dispatcher,
        Arc::new(tokio::sync::Notify::new()),
    ));
    ctx.spawn_pump(view_rx);

    let socket_path = workspace_root.join("obd.sock");
    let socket = tokio::net::UnixListener::bind(&socket_path).unwrap();
    tokio::spawn(Listener::new(socket, Arc::clone(&ctx)).run());

    let mut client = tokio::net::UnixStream::connect(&socket_path).await.unwrap();

    // Handshake
    let hello = wire::encode(&Request::Hello {
        version: "test".into(),
    })
    .unwrap();
    wire::write_message(&mut client, &hello).await.unwrap();
    let frame = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        wire::read_message(&mut client),
    )
    .await
    .unwrap()
    .unwrap();
    let ack: Response = wire::decode(&frame).unwrap();
    assert!(matches!(ack, Response::Hello { .. }));

    // Ready replay streams back as view messages
    let ready = wire::encode(&Request::Command(Command::Ready)).unwrap();
    wire::write_message(&mut client, &ready).await.unwrap();

    let frame = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        wire::read_message(&mut client),
    )
    .await
    .unwrap()
    .unwrap();
    let first: ViewMessage = wire::decode(&frame).unwrap();
    match first {
        ViewMessage::UpdateTasks { tasks } => {
            assert_eq!(tasks.len(), 1);
            assert_eq!(tasks[0].label, "build");
        }
        other => panic!("expected updateTasks first, got {other:?}"),
    }

    client.shutdown().await.unwrap();
}

// --- Duration history feeds the next start ---

#[tokio::test]
async fn average_duration_round_trip() {
    let mut stack = stack();
    let build = workspace_task("build");
    stack.host.set_tasks(vec![build.clone()]);

    stack.start(&build).await;
    stack.clock.advance(std::time::Duration::from_millis(300));
    stack.end(&build, 0).await;
    stack.drain();

    stack.orchestrator.run_task("build").await;
    stack.drain();
    stack.start(&build).await;

    let messages = stack.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::TaskStarted { avg_duration: Some(300), is_first_run: false, .. })));
}
