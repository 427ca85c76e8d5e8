// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ob_adapters::{FakeNotifyAdapter, FakeTaskHost, FakeTerminals, HostCall};
use ob_core::test_support::workspace_task;
use ob_core::{Command, FakeClock, PanelStateUpdate, TaskId};
use ob_engine::{EngineConfig, EngineDeps};
use ob_storage::{MemoryKvStore, Persistence};
use tempfile::tempdir;
use tokio::sync::mpsc;

type TestDispatcher = Dispatcher<FakeTaskHost, FakeTerminals, FakeNotifyAdapter, FakeClock>;

struct TestContext {
    dispatcher: TestDispatcher,
    host: FakeTaskHost,
    view_rx: mpsc::UnboundedReceiver<ViewMessage>,
    docs_root: std::path::PathBuf,
}

fn setup() -> TestContext {
    let dir = tempdir().unwrap();
    let workspace_root = dir.keep();
    let docs_root = workspace_root.join("docs");
    std::fs::create_dir_all(&docs_root).unwrap();

    let host = FakeTaskHost::new();
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
        orchestrator,
        DocLoader::new(docs_root.clone()),
        LogBuffer::new(),
    );

    TestContext {
        dispatcher,
        host,
        view_rx,
        docs_root,
    }
}

impl TestContext {
    fn drain(&mut self) -> Vec<ViewMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.view_rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn write_doc(&self, name: &str, content: &str) {
        std::fs::write(self.docs_root.join(name), content).unwrap();
    }
}

#[tokio::test]
async fn ready_replays_tasks_nav_and_lists() {
    let mut ctx = setup();
    ctx.host.set_tasks(vec![workspace_task("build")]);
    ctx.write_doc("index.mdx", "# Welcome");

    ctx.dispatcher.handle(Command::Ready).await;

    let messages = ctx.drain();
    let kinds: Vec<_> = messages.iter().map(|m| m.name()).collect();
    assert!(kinds.contains(&"updateTasks"));
    assert!(kinds.contains(&"updateNavigationHistory"));
    assert!(kinds.contains(&"loadMdx"));
    assert!(kinds.contains(&"updateRecentlyUsed"));
    assert!(kinds.contains(&"updateStarred"));
    assert!(kinds.contains(&"panelState"));

    // The default document loads when there is no history
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::LoadMdx { file, content } if file == "index.mdx" && content == "# Welcome")));
}

#[tokio::test]
async fn navigate_pushes_history_and_loads() {
    let mut ctx = setup();
    ctx.write_doc("guide.mdx", "guide body");

    ctx.dispatcher
        .handle(Command::Navigate {
            file: "guide.mdx".into(),
        })
        .await;

    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::UpdateNavigationHistory { entries, index }
            if entries == &vec!["guide.mdx".to_string()] && *index == 0)));
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::LoadMdx { content, .. } if content == "guide body")));

    // History is persisted for the next session
    let (entries, index) = ctx
        .dispatcher
        .orchestrator
        .persistence()
        .navigation()
        .await;
    assert_eq!(entries, vec!["guide.mdx"]);
    assert_eq!(index, 0);
}

#[tokio::test]
async fn navigate_back_and_forward() {
    let mut ctx = setup();
    ctx.write_doc("a.mdx", "A");
    ctx.write_doc("b.mdx", "B");

    ctx.dispatcher
        .handle(Command::Navigate { file: "a.mdx".into() })
        .await;
    ctx.dispatcher
        .handle(Command::Navigate { file: "b.mdx".into() })
        .await;
    ctx.drain();

    ctx.dispatcher.handle(Command::NavigateBack).await;
    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::LoadMdx { file, .. } if file == "a.mdx")));

    ctx.dispatcher.handle(Command::NavigateForward).await;
    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::LoadMdx { file, .. } if file == "b.mdx")));
}

#[tokio::test]
async fn navigate_back_at_origin_is_silent() {
    let mut ctx = setup();
    ctx.dispatcher.handle(Command::NavigateBack).await;
    assert!(ctx.drain().is_empty());
}

#[tokio::test]
async fn navigate_to_missing_document_reports_error() {
    let mut ctx = setup();
    ctx.dispatcher
        .handle(Command::Navigate {
            file: "ghost.mdx".into(),
        })
        .await;
    assert!(ctx
        .drain()
        .iter()
        .any(|m| matches!(m, ViewMessage::Error { .. })));
}

#[tokio::test]
async fn jump_truncates_forward_history() {
    let mut ctx = setup();
    for name in ["a.mdx", "b.mdx", "c.mdx"] {
        ctx.write_doc(name, name);
        ctx.dispatcher
            .handle(Command::Navigate { file: name.into() })
            .await;
    }
    ctx.drain();

    ctx.dispatcher
        .handle(Command::NavigateToHistoryItem { index: 0 })
        .await;
    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::UpdateNavigationHistory { entries, index }
            if entries == &vec!["a.mdx".to_string()] && *index == 0)));
}

#[tokio::test]
async fn toggle_star_echoes_starred_list() {
    let mut ctx = setup();
    ctx.dispatcher
        .handle(Command::ToggleStar {
            label: "workspace|build".into(),
        })
        .await;
    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::UpdateStarred { tasks }
            if tasks == &vec![TaskId::new("workspace|build")])));
}

#[tokio::test]
async fn set_panel_state_merges_and_echoes() {
    let mut ctx = setup();
    ctx.dispatcher
        .handle(Command::SetPanelState {
            update: PanelStateUpdate {
                starred_collapsed: Some(true),
                ..Default::default()
            },
        })
        .await;
    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::PanelState { state } if state.starred_collapsed)));
}

#[tokio::test]
async fn get_log_buffer_returns_lines() {
    let mut ctx = setup();
    ctx.dispatcher.logbuf.push("hello from the daemon");
    ctx.dispatcher.handle(Command::GetLogBuffer).await;
    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::LogBuffer { lines } if lines == &vec!["hello from the daemon".to_string()])));
}

#[tokio::test]
async fn copy_tasks_json_serializes_host_tasks() {
    let mut ctx = setup();
    ctx.host.set_tasks(vec![workspace_task("build")]);
    ctx.dispatcher.handle(Command::CopyTasksJson).await;
    let messages = ctx.drain();
    let json = messages
        .iter()
        .find_map(|m| match m {
            ViewMessage::TasksJson { json } => Some(json.clone()),
            _ => None,
        })
        .expect("tasksJson");
    assert!(json.contains("\"build\""));
}

#[tokio::test]
async fn run_task_command_reaches_the_engine() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.dispatcher
        .handle(Command::RunTask {
            label: "build".into(),
        })
        .await;

    assert!(ctx
        .host
        .calls()
        .contains(&HostCall::Execute { task: build.id() }));
    ctx.drain();
}

#[tokio::test]
async fn unknown_command_is_ignored() {
    let mut ctx = setup();
    ctx.dispatcher.handle(Command::Unknown).await;
    assert!(ctx.drain().is_empty());
}
