// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stop-protocol tests

use super::*;
use ob_core::test_support::{task_with_deps, workspace_task};
use ob_core::{ReportedState, EXIT_STOPPED};

#[tokio::test]
async fn stop_with_descendants_runs_all_three_phases() {
    let mut ctx = setup();
    let root = task_with_deps("root", &["alpha", "beta"]);
    let alpha = workspace_task("alpha");
    let beta = workspace_task("beta");
    ctx.host
        .set_tasks(vec![root.clone(), alpha.clone(), beta.clone()]);
    ctx.terminals.add("Task - root");
    ctx.terminals.add("Task - alpha");
    ctx.terminals.add("unrelated shell");

    ctx.start(&root).await;
    ctx.start(&alpha).await;
    ctx.start(&beta).await;
    ctx.drain();

    ctx.orchestrator.stop_task("root").await;
    let messages = ctx.drain();

    // Descendants got synthetic ends with the stop exit code
    for descendant in [&alpha, &beta] {
        assert!(
            messages.iter().any(|m| matches!(m,
                ViewMessage::TaskEnded { task_label, exit_code, duration: 0, .. }
                    if *task_label == descendant.id() && *exit_code == EXIT_STOPPED)),
            "missing taskEnded for {}",
            descendant.id()
        );
        assert!(ctx.host.terminated(&descendant.id()));
    }

    // Root: stopping, then stopped, then its own taskEnded
    let stopping = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStateChanged { task_label, state, .. }
            if *task_label == root.id() && *state == ReportedState::Stopping)
    })
    .expect("stopping state change");
    let stopped = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStateChanged { task_label, state, .. }
            if *task_label == root.id() && *state == ReportedState::Stopped)
    })
    .expect("stopped state change");
    let ended = position(&messages, |m| {
        matches!(m, ViewMessage::TaskEnded { task_label, exit_code, .. }
            if *task_label == root.id() && *exit_code == EXIT_STOPPED)
    })
    .expect("root taskEnded");
    assert!(stopping < stopped);
    assert!(stopped < ended);

    // Terminal sweep disposed name-matched terminals and spared the rest
    let disposed = ctx.terminals.disposed();
    assert!(disposed.contains(&"Task - root".to_string()));
    assert!(disposed.contains(&"Task - alpha".to_string()));
    assert!(!disposed.contains(&"unrelated shell".to_string()));

    // All tracking is gone
    for task in [&root, &alpha, &beta] {
        assert!(!ctx.orchestrator.tracker.is_tracked(&task.id()));
    }
}

#[tokio::test]
async fn stop_unknown_task_emits_exactly_one_stopped() {
    let mut ctx = setup();
    ctx.orchestrator.stop_task("workspace|ghost").await;

    let messages = ctx.drain();
    assert_eq!(names(&messages), vec!["taskStateChanged"]);
    assert!(matches!(&messages[0],
        ViewMessage::TaskStateChanged { state, .. } if *state == ReportedState::Stopped));
}

#[tokio::test]
async fn concurrent_stops_terminate_once() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);
    ctx.start(&build).await;
    ctx.drain();

    let first = {
        let orchestrator = Arc::clone(&ctx.orchestrator);
        tokio::spawn(async move { orchestrator.stop_task("build").await })
    };
    let second = {
        let orchestrator = Arc::clone(&ctx.orchestrator);
        tokio::spawn(async move { orchestrator.stop_task("build").await })
    };
    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(ctx.host.terminate_count(&build.id()), 1);
}

#[tokio::test]
async fn stop_adopts_handle_for_proxy_parent() {
    let mut ctx = setup();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host.set_tasks(vec![parent.clone(), child.clone()]);
    ctx.orchestrator
        .hierarchy
        .add_child(&parent.id(), &child.id());

    // Child start synthesizes the proxy parent (no handle recorded) …
    ctx.start(&child).await;
    // … but the host does know about a live parent execution
    ctx.host.add_active(parent.clone());
    ctx.drain();

    ctx.orchestrator.stop_task("parent").await;

    assert!(ctx.host.terminated(&parent.id()));
}

#[tokio::test]
async fn late_start_after_stop_is_silenced_once() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);
    ctx.start(&build).await;
    ctx.drain();

    ctx.orchestrator.stop_task("build").await;
    ctx.drain();

    // Host echoes a late start for the stopped task: dropped silently
    ctx.start(&build).await;
    assert!(ctx.drain().is_empty());
    assert!(!ctx.orchestrator.tracker.is_cancelled(&build.id()));

    // The marker was consumed by that one event; a fresh start works
    ctx.start(&build).await;
    assert!(!ctx.drain().is_empty());
}

#[tokio::test]
async fn stop_when_every_route_fails_still_clears_and_reports() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);
    ctx.host.fail_terminate(&build.id());

    ctx.start(&build).await;
    ctx.drain();

    ctx.orchestrator.stop_task("build").await;
    let messages = ctx.drain();

    // Best-effort: tracking cleared, exit code 0 signals "not confirmed"
    assert!(!ctx.orchestrator.tracker.is_tracked(&build.id()));
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::TaskEnded { task_label, exit_code: 0, .. }
            if *task_label == build.id())));
}

#[tokio::test]
async fn stop_root_failure_falls_back_to_terminal_sweep() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);
    ctx.host.fail_terminate(&build.id());
    ctx.terminals.add("Task - build (leaked shell)");

    ctx.start(&build).await;
    ctx.drain();

    ctx.orchestrator.stop_task("build").await;
    let messages = ctx.drain();

    assert_eq!(
        ctx.terminals.disposed(),
        vec!["Task - build (leaked shell)"]
    );
    // Sweep succeeded, so the stop is confirmed
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::TaskEnded { task_label, exit_code, .. }
            if *task_label == build.id() && *exit_code == EXIT_STOPPED)));
}

#[tokio::test]
async fn stop_twice_sequentially_second_is_a_noop() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);
    ctx.start(&build).await;
    ctx.drain();

    ctx.orchestrator.stop_task("build").await;
    ctx.drain();
    ctx.orchestrator.stop_task("build").await;

    let messages = ctx.drain();
    assert_eq!(names(&messages), vec!["taskStateChanged"]);
    assert_eq!(ctx.host.terminate_count(&build.id()), 1);
}
