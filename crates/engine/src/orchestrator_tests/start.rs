// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-event and proxy-parent tests

use super::*;
use ob_core::test_support::{task_with_deps, workspace_task};
use ob_core::{ReportedState, TaskState};

#[tokio::test]
async fn plain_start_emits_task_started() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;

    let messages = ctx.drain();
    assert_eq!(names(&messages), vec!["taskStarted"]);
    match &messages[0] {
        ViewMessage::TaskStarted {
            task_label,
            is_first_run,
            is_dependency_proxy,
            parent_task,
            ..
        } => {
            assert_eq!(*task_label, build.id());
            assert!(is_first_run);
            assert!(!is_dependency_proxy);
            assert!(parent_task.is_none());
        }
        other => panic!("unexpected message: {other:?}"),
    }
    assert_eq!(
        ctx.orchestrator.tracker.state(&build.id()),
        Some(TaskState::Running)
    );
}

#[tokio::test]
async fn proxy_parent_is_synthesized_before_child() {
    let mut ctx = setup();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host.set_tasks(vec![parent.clone(), child.clone()]);
    ctx.orchestrator
        .hierarchy
        .add_child(&parent.id(), &child.id());

    // Child starts with no prior parent start
    ctx.start(&child).await;

    let messages = ctx.drain();
    let parent_started = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStarted { task_label, is_dependency_proxy, .. }
            if *task_label == parent.id() && *is_dependency_proxy)
    })
    .expect("proxy taskStarted for parent");
    let edge = position(&messages, |m| {
        matches!(m, ViewMessage::SubtaskStarted { parent: p, child: c, .. }
            if *p == parent.id() && *c == child.id())
    })
    .expect("subtaskStarted edge");
    let child_started = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == child.id())
    })
    .expect("taskStarted for child");

    assert!(parent_started < edge);
    assert!(edge < child_started);

    // Exactly one proxy start for the parent
    let proxy_count = messages
        .iter()
        .filter(|m| {
            matches!(m, ViewMessage::TaskStarted { task_label, is_dependency_proxy, .. }
                if *task_label == parent.id() && *is_dependency_proxy)
        })
        .count();
    assert_eq!(proxy_count, 1);

    // Proxy parent is running and stoppable but not focusable
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::TaskStateChanged { task_label, state, can_stop, can_focus }
            if *task_label == parent.id()
                && *state == ReportedState::Running
                && *can_stop
                && !*can_focus)));
    assert_eq!(
        ctx.orchestrator.tracker.state(&parent.id()),
        Some(TaskState::Running)
    );
    assert!(!ctx.orchestrator.tracker.has_execution(&parent.id()));
}

#[tokio::test]
async fn grandparent_chain_is_synthesized_upward() {
    let mut ctx = setup();
    let grandparent = task_with_deps("gp", &["parent"]);
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host
        .set_tasks(vec![grandparent.clone(), parent.clone(), child.clone()]);
    ctx.orchestrator
        .hierarchy
        .add_child(&grandparent.id(), &parent.id());
    ctx.orchestrator
        .hierarchy
        .add_child(&parent.id(), &child.id());

    ctx.start(&child).await;

    let messages = ctx.drain();
    let gp_started = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == grandparent.id())
    })
    .expect("grandparent started");
    let parent_started = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == parent.id())
    })
    .expect("parent started");
    let child_started = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == child.id())
    })
    .expect("child started");
    assert!(gp_started < parent_started);
    assert!(parent_started < child_started);
}

#[tokio::test]
async fn duplicate_start_is_idempotent() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    let handle = ctx.host.add_active(build.clone());
    ctx.orchestrator
        .on_task_start(StartEvent::new(build.clone(), handle.clone()))
        .await;
    let first_start = ctx.orchestrator.tracker.start_time(&build.id());
    ctx.drain();

    ctx.clock.advance(std::time::Duration::from_secs(1));
    ctx.orchestrator
        .on_task_start(StartEvent::new(build.clone(), handle))
        .await;

    assert!(ctx.drain().is_empty());
    assert_eq!(
        ctx.orchestrator.tracker.start_time(&build.id()),
        first_start
    );
    assert_eq!(
        ctx.orchestrator.tracker.state(&build.id()),
        Some(TaskState::Running)
    );
}

#[tokio::test]
async fn cancelled_start_is_dropped_and_marker_consumed() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);
    ctx.orchestrator.tracker.mark_cancelled(&build.id());

    ctx.start(&build).await;

    assert!(ctx.drain().is_empty());
    assert!(!ctx.orchestrator.tracker.is_cancelled(&build.id()));
    assert_eq!(ctx.orchestrator.tracker.state(&build.id()), None);
}

#[tokio::test]
async fn start_clears_stale_completion() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    let stale = ob_core::TaskResult::from_exit(1, 10, 5, vec![], None);
    ctx.orchestrator
        .persistence
        .save_completed_task(&build.id(), &stale)
        .await;

    ctx.start(&build).await;
    ctx.drain();

    let completed = ctx.orchestrator.persistence.completed_tasks().await;
    assert!(!completed.contains_key(&build.id()));
}

#[tokio::test]
async fn start_discovers_parent_from_active_executions() {
    let mut ctx = setup();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host.set_tasks(vec![parent.clone(), child.clone()]);
    // Parent runs in the host but the engine never saw it start
    ctx.host.add_active(parent.clone());

    ctx.start(&child).await;

    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::SubtaskStarted { parent: p, child: c, .. }
            if *p == parent.id() && *c == child.id())));
    // The discovered handle is recorded so stop can reach the parent
    assert!(ctx.orchestrator.tracker.has_execution(&parent.id()));
}

#[tokio::test]
async fn second_run_reports_average_duration() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;
    ctx.clock.advance(std::time::Duration::from_millis(400));
    ctx.end(&build, 0).await;
    ctx.drain();

    ctx.start(&build).await;
    let messages = ctx.drain();
    match &messages[0] {
        ViewMessage::TaskStarted {
            avg_duration,
            is_first_run,
            ..
        } => {
            assert_eq!(*avg_duration, Some(400));
            assert!(!is_first_run);
        }
        other => panic!("unexpected message: {other:?}"),
    }
}
