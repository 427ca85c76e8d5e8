// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-protocol tests

use super::*;
use ob_adapters::{HostCall, NotifyLevel};
use ob_core::test_support::{task_with_deps, workspace_task};

#[tokio::test]
async fn run_executes_and_records_handle() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.orchestrator.run_task("build").await;

    assert!(ctx
        .host
        .calls()
        .contains(&HostCall::Execute { task: build.id() }));
    assert!(ctx.orchestrator.tracker.has_execution(&build.id()));
    assert!(ctx.orchestrator.tracker.is_pending(&build.id()));

    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::DismissTaskGroup { label } if *label == build.id())));
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::UpdateRecentlyUsed { tasks } if tasks == &vec![build.id()])));
}

#[tokio::test]
async fn run_unknown_task_notifies_and_aborts() {
    let mut ctx = setup();
    ctx.orchestrator.run_task("ghost").await;

    assert!(!ctx
        .host
        .calls()
        .iter()
        .any(|c| matches!(c, HostCall::Execute { .. })));
    let errors = ctx.notifier.messages_at(NotifyLevel::Error);
    assert_eq!(errors, vec!["Task not found: ghost"]);
    assert!(ctx
        .drain()
        .iter()
        .any(|m| matches!(m, ViewMessage::Error { .. })));
}

#[tokio::test]
async fn rerun_of_grandchild_clears_whole_persisted_group() {
    let mut ctx = setup();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host.set_tasks(vec![parent.clone(), child.clone()]);

    // Scenario 1 end-state: parent and child both persisted as failed
    ctx.start(&parent).await;
    ctx.start(&child).await;
    ctx.end(&child, 1).await;
    ctx.drain();
    let persisted = ctx.orchestrator.persistence.completed_tasks().await;
    assert!(persisted.contains_key(&parent.id()));
    assert!(persisted.contains_key(&child.id()));

    ctx.orchestrator.run_task("child").await;
    let messages = ctx.drain();

    // The stale group is dismissed via its top-most ancestor
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::DismissTaskGroup { label } if *label == parent.id())));
    let persisted = ctx.orchestrator.persistence.completed_tasks().await;
    assert!(!persisted.contains_key(&parent.id()));
    assert!(!persisted.contains_key(&child.id()));
}

#[tokio::test]
async fn run_clears_stale_tracking_for_the_tree() {
    let ctx = setup();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host.set_tasks(vec![parent.clone(), child.clone()]);

    ctx.start(&parent).await;
    ctx.start(&child).await;
    ctx.orchestrator.tracker.mark_cancelled(&child.id());

    ctx.orchestrator.run_task("parent").await;

    assert!(!ctx.orchestrator.tracker.is_cancelled(&child.id()));
    // Fresh registration for the new run
    assert_eq!(
        ctx.orchestrator.hierarchy.children(&parent.id()),
        vec![child.id()]
    );
}

#[tokio::test]
async fn run_with_cyclic_dependency_tree_terminates() {
    let ctx = setup();
    let a = task_with_deps("a", &["b"]);
    let b = task_with_deps("b", &["a"]);
    ctx.host.set_tasks(vec![a.clone(), b.clone()]);

    ctx.orchestrator.run_task("a").await;

    assert!(ctx
        .host
        .calls()
        .contains(&HostCall::Execute { task: a.id() }));
}

#[tokio::test]
async fn run_execute_failure_surfaces_to_operator() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);
    ctx.host.fail_execute(&build.id());

    ctx.orchestrator.run_task("build").await;

    assert!(!ctx.orchestrator.tracker.has_execution(&build.id()));
    assert!(!ctx.notifier.messages_at(NotifyLevel::Error).is_empty());
    assert!(ctx
        .drain()
        .iter()
        .any(|m| matches!(m, ViewMessage::Error { .. })));
    // No recents update for a failed launch
    assert!(ctx.orchestrator.persistence.recently_used().await.is_empty());
}

#[tokio::test]
async fn run_legacy_npm_prefix() {
    let ctx = setup();
    let watch = ob_core::test_support::npm_task("watch");
    ctx.host.set_tasks(vec![watch.clone()]);

    ctx.orchestrator.run_task("npm: watch").await;

    assert!(ctx
        .host
        .calls()
        .contains(&HostCall::Execute { task: watch.id() }));
}
