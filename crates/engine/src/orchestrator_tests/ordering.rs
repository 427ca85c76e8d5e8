// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-queue ordering and replay tests

use super::*;
use ob_core::test_support::{task_with_deps, workspace_task};

#[tokio::test]
async fn concurrent_chain_starts_emit_in_arrival_order() {
    let mut ctx = setup();
    // t1 … t5, where each task lists the previous one as a dependency
    let tasks: Vec<_> = (1..=5)
        .map(|n| {
            if n == 1 {
                workspace_task("t1")
            } else {
                task_with_deps(&format!("t{n}"), &[&format!("t{}", n - 1)])
            }
        })
        .collect();
    ctx.host.set_tasks(tasks.clone());

    let mut handles = Vec::new();
    for task in &tasks {
        let orchestrator = Arc::clone(&ctx.orchestrator);
        // Handle only: in a deps-first host the later chain members are
        // not executing yet when the early ones start
        let handle = ctx.host.handle_for(task);
        let task = task.clone();
        handles.push(tokio::spawn(async move {
            orchestrator
                .on_task_start(StartEvent::new(task, handle))
                .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let messages = ctx.drain();
    let started_order: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            ViewMessage::TaskStarted { task_label, .. } => Some(task_label.name().to_string()),
            _ => None,
        })
        .collect();

    // One taskStarted per task, in firing order
    assert_eq!(started_order, vec!["t1", "t2", "t3", "t4", "t5"]);

    // Every subtask edge is well ordered against its parent's start
    for (edge_pos, m) in messages.iter().enumerate() {
        if let ViewMessage::SubtaskStarted { parent, .. } = m {
            let parent_pos = position(&messages, |x| {
                matches!(x, ViewMessage::TaskStarted { task_label, .. } if task_label == parent)
            })
            .unwrap();
            assert!(parent_pos < edge_pos);
        }
    }
}

#[tokio::test]
async fn siblings_start_after_their_shared_parent() {
    let mut ctx = setup();
    let parent = task_with_deps("parent", &["a", "b", "c"]);
    let children: Vec<_> = ["a", "b", "c"].iter().map(|n| workspace_task(n)).collect();
    let mut tasks = vec![parent.clone()];
    tasks.extend(children.clone());
    ctx.host.set_tasks(tasks);
    ctx.host.add_active(parent.clone());

    // Three leaf starts land concurrently, parent never started
    let mut handles = Vec::new();
    for child in &children {
        let orchestrator = Arc::clone(&ctx.orchestrator);
        let handle = ctx.host.add_active(child.clone());
        let child = child.clone();
        handles.push(tokio::spawn(async move {
            orchestrator
                .on_task_start(StartEvent::new(child, handle))
                .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let messages = ctx.drain();
    let parent_pos = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == parent.id())
    })
    .expect("parent taskStarted");

    // Exactly one parent start, before every child start and edge
    for child in &children {
        let child_pos = position(&messages, |m| {
            matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == child.id())
        })
        .unwrap_or_else(|| panic!("taskStarted for {}", child.id()));
        let edge_pos = position(&messages, |m| {
            matches!(m, ViewMessage::SubtaskStarted { child: c, .. } if *c == child.id())
        })
        .unwrap_or_else(|| panic!("subtaskStarted for {}", child.id()));
        assert!(parent_pos < edge_pos);
        assert!(edge_pos < child_pos);
    }
    let parent_starts = messages
        .iter()
        .filter(|m| {
            matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == parent.id())
        })
        .count();
    assert_eq!(parent_starts, 1);
}

#[tokio::test]
async fn replay_emits_parents_before_children() {
    let mut ctx = setup();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host.set_tasks(vec![parent.clone(), child.clone()]);

    ctx.start(&parent).await;
    ctx.start(&child).await;
    ctx.drain();

    ctx.orchestrator.replay_state().await;
    let messages = ctx.drain();

    let parent_pos = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == parent.id())
    })
    .expect("parent replayed");
    let child_pos = position(&messages, |m| {
        matches!(m, ViewMessage::TaskStarted { task_label, .. } if *task_label == child.id())
    })
    .expect("child replayed");
    assert!(parent_pos < child_pos);
}

#[tokio::test]
async fn replay_includes_persisted_completions() {
    let mut ctx = setup();
    let build = workspace_task("build");
    ctx.host.set_tasks(vec![build.clone()]);

    ctx.start(&build).await;
    ctx.end(&build, 1).await;
    ctx.drain();

    ctx.orchestrator.replay_state().await;
    let messages = ctx.drain();
    assert!(messages.iter().any(|m| matches!(m,
        ViewMessage::TaskCompleted { task_label, exit_code: 1, failed: true, .. }
            if *task_label == build.id())));
}

#[tokio::test]
async fn dismiss_removes_transitive_completions() {
    let mut ctx = setup();
    let parent = task_with_deps("parent", &["child"]);
    let child = workspace_task("child");
    ctx.host.set_tasks(vec![parent.clone(), child.clone()]);

    ctx.start(&parent).await;
    ctx.start(&child).await;
    ctx.end(&child, 1).await;
    ctx.drain();

    ctx.orchestrator.dismiss_task(parent.id().as_str()).await;

    let persisted = ctx.orchestrator.persistence.completed_tasks().await;
    assert!(persisted.is_empty());
    assert!(ctx.drain().iter().any(|m| matches!(m,
        ViewMessage::DismissTaskGroup { label } if *label == parent.id())));
}
