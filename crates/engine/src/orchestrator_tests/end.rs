// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-event and failure-propagation tests

use super::*;
use ob_core::test_support::{task_with_deps, workspace_task};
use ob_core::{TaskState, EXIT_DEPENDENCY_FAILED};

#[tokio::test]
async fn successful_end_completes_and_clears() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;
    ctx.clock.advance(std::time::Duration::from_millis(250));
    ctx.end(&build, 0).await;

    let messages = ctx.drain();
    let completed = messages
        .iter()
        .find_map(|m| match m {
            ViewMessage::TaskCompleted {
                task_label,
                exit_code,
                failed,
                duration,
                ..
            } if *task_label == build.id() => Some((*exit_code, *failed, *duration)),
            _ => None,
        })
        .expect("taskCompleted");
    assert_eq!(completed, (0, false, 250));

    // All live tracking is gone; the ID is no longer a hierarchy key
    assert!(!ctx.orchestrator.tracker.is_tracked(&build.id()));
    assert_eq!(ctx.orchestrator.tracker.state(&build.id()), None);
    assert!(!ctx
        .orchestrator
        .hierarchy
        .parent_keys()
        .contains(&build.id()));

    // Result is persisted and survives in memory
    let persisted = ctx.orchestrator.persistence.completed_tasks().await;
    assert_eq!(persisted[&build.id()].exit_code, 0);
    assert!(ctx.orchestrator.tracker.result(&build.id()).is_some());
}

#[tokio::test]
async fn successful_end_updates_duration_history() {
    let ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;
    ctx.clock.advance(std::time::Duration::from_millis(100));
    ctx.end(&build, 0).await;

    let history = ctx.orchestrator.persistence.task_history(&build.id()).await;
    assert_eq!(history.count, 1);
    assert_eq!(history.durations, vec![100]);
}

#[tokio::test]
async fn failed_end_does_not_update_history() {
    let ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;
    ctx.end(&build, 2).await;

    let history = ctx.orchestrator.persistence.task_history(&build.id()).await;
    assert_eq!(history.count, 0);
}

#[tokio::test]
async fn dependency_failure_propagates_to_parent() {
    let mut ctx = setup();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host.set_tasks(vec![parent.clone(), child.clone()]);

    ctx.start(&parent).await;
    ctx.start(&child).await;
    ctx.drain();

    ctx.end(&child, 1).await;
    let messages = ctx.drain();

    // Edge closes, parent fails synthetically, child completes
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::SubtaskEnded { parent: p, child: c, exit_code: 1, failed: true }
            if *p == parent.id() && *c == child.id())));

    let parent_completed = messages
        .iter()
        .find_map(|m| match m {
            ViewMessage::TaskCompleted {
                task_label,
                exit_code,
                failed,
                reason,
                failed_dependency,
                ..
            } if *task_label == parent.id() => Some((
                *exit_code,
                *failed,
                reason.clone(),
                failed_dependency.clone(),
            )),
            _ => None,
        })
        .expect("parent taskCompleted");
    assert_eq!(parent_completed.0, EXIT_DEPENDENCY_FAILED);
    assert!(parent_completed.1);
    assert_eq!(
        parent_completed.2.as_deref(),
        Some("Dependency failed: child (exit code 1)")
    );
    assert_eq!(parent_completed.3, Some(child.id()));

    // Parent's completion reaches the view before the child's
    let parent_pos = position(&messages, |m| {
        matches!(m, ViewMessage::TaskCompleted { task_label, .. } if *task_label == parent.id())
    })
    .unwrap();
    let child_pos = position(&messages, |m| {
        matches!(m, ViewMessage::TaskCompleted { task_label, .. } if *task_label == child.id())
    })
    .unwrap();
    assert!(parent_pos < child_pos);

    // Parent's live execution observed terminate()
    assert!(ctx.host.terminated(&parent.id()));

    // Both results persisted
    let persisted = ctx.orchestrator.persistence.completed_tasks().await;
    assert_eq!(persisted[&parent.id()].exit_code, EXIT_DEPENDENCY_FAILED);
    assert_eq!(persisted[&parent.id()].failed_dependency, Some(child.id()));
    assert_eq!(persisted[&child.id()].exit_code, 1);
}

#[tokio::test]
async fn propagation_climbs_the_whole_chain() {
    let mut ctx = setup();
    let grandparent = task_with_deps("gp", &["parent"]);
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host
        .set_tasks(vec![grandparent.clone(), parent.clone(), child.clone()]);

    ctx.start(&grandparent).await;
    ctx.start(&parent).await;
    ctx.start(&child).await;
    ctx.drain();

    ctx.end(&child, 3).await;
    let messages = ctx.drain();

    let gp_completed = messages
        .iter()
        .find_map(|m| match m {
            ViewMessage::TaskCompleted {
                task_label,
                failed_dependency,
                ..
            } if *task_label == grandparent.id() => Some(failed_dependency.clone()),
            _ => None,
        })
        .expect("grandparent taskCompleted");
    // The grandparent's failed dependency is the mid-level parent
    assert_eq!(gp_completed, Some(parent.id()));
    assert!(!ctx.orchestrator.tracker.is_tracked(&grandparent.id()));
}

#[tokio::test]
async fn propagation_terminates_on_cyclic_hierarchy() {
    let mut ctx = setup();
    let a = task_with_deps("a", &["b"]);
    let b = task_with_deps("b", &["a"]);
    ctx.host.set_tasks(vec![a.clone(), b.clone()]);

    ctx.start(&a).await;
    ctx.start(&b).await;
    ctx.drain();

    // Must not loop forever
    ctx.end(&b, 1).await;
    let messages = ctx.drain();
    assert!(messages
        .iter()
        .any(|m| matches!(m, ViewMessage::TaskCompleted { .. })));
}

#[tokio::test]
async fn end_for_stopping_task_is_dropped() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;
    ctx.orchestrator
        .tracker
        .set_state(&build.id(), TaskState::Stopping);
    ctx.drain();

    ctx.end(&build, 0).await;

    assert!(ctx.drain().is_empty());
    assert!(!ctx.orchestrator.tracker.is_tracked(&build.id()));
    let persisted = ctx.orchestrator.persistence.completed_tasks().await;
    assert!(!persisted.contains_key(&build.id()));
}

#[tokio::test]
async fn end_for_cancelled_task_is_dropped_and_marker_consumed() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;
    ctx.drain();
    ctx.orchestrator.tracker.mark_cancelled(&build.id());

    ctx.end(&build, 1).await;

    assert!(ctx.drain().is_empty());
    assert!(!ctx.orchestrator.tracker.is_cancelled(&build.id()));
}

#[tokio::test]
async fn end_without_exit_code_is_success() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;
    ctx.drain();
    ctx.orchestrator
        .on_task_end(EndEvent::new(build.clone(), None))
        .await;

    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::TaskCompleted { exit_code: 0, failed: false, .. })));
}
