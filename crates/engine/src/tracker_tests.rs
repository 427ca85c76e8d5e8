// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ob_adapters::FakeTaskHost;
use ob_core::test_support::workspace_task;

fn id(name: &str) -> TaskId {
    TaskId::new(format!("workspace|{name}"))
}

#[test]
fn absent_state_means_unknown() {
    let tracker = Tracker::new();
    assert_eq!(tracker.state(&id("x")), None);
    assert!(!tracker.is_tracked(&id("x")));
}

#[test]
fn state_roundtrip() {
    let tracker = Tracker::new();
    tracker.set_state(&id("x"), TaskState::Running);
    assert_eq!(tracker.state(&id("x")), Some(TaskState::Running));
    tracker.set_state(&id("x"), TaskState::Stopping);
    assert_eq!(tracker.state(&id("x")), Some(TaskState::Stopping));
}

#[test]
fn running_tasks_filters_by_state() {
    let tracker = Tracker::new();
    tracker.set_state(&id("a"), TaskState::Running);
    tracker.set_state(&id("b"), TaskState::Failed);
    assert_eq!(tracker.running_tasks(), vec![id("a")]);
}

#[tokio::test]
async fn execution_handle_roundtrip() {
    let tracker = Tracker::new();
    let host = FakeTaskHost::new();
    let handle = host.add_active(workspace_task("x"));
    tracker.set_execution(&id("x"), handle);
    assert!(tracker.has_execution(&id("x")));
    assert_eq!(tracker.execution(&id("x")).unwrap().task_id(), id("x"));
}

#[test]
fn take_cancelled_consumes_the_entry() {
    let tracker = Tracker::new();
    tracker.mark_cancelled(&id("x"));
    assert!(tracker.is_cancelled(&id("x")));
    assert!(tracker.take_cancelled(&id("x")));
    assert!(!tracker.is_cancelled(&id("x")));
    assert!(!tracker.take_cancelled(&id("x")));
}

#[test]
fn mark_stopping_claims_once() {
    let tracker = Tracker::new();
    assert!(tracker.mark_stopping(&id("x")));
    assert!(!tracker.mark_stopping(&id("x")));
    tracker.unmark_stopping(&id("x"));
    assert!(tracker.mark_stopping(&id("x")));
}

#[test]
fn proxy_setup_guard_claims_once() {
    let tracker = Tracker::new();
    assert!(tracker.begin_proxy_setup(&id("p")));
    assert!(!tracker.begin_proxy_setup(&id("p")));
    tracker.end_proxy_setup(&id("p"));
    assert!(tracker.begin_proxy_setup(&id("p")));
}

#[test]
fn clear_tracking_removes_live_state_keeps_result() {
    let tracker = Tracker::new();
    let task = id("x");
    tracker.set_state(&task, TaskState::Running);
    tracker.set_start_time(&task, std::time::Instant::now(), 1_000);
    tracker.mark_pending(&task);
    tracker.set_result(
        &task,
        TaskResult::from_exit(0, 1_000, 10, vec![], None),
    );

    tracker.clear_tracking(&task);

    assert!(!tracker.is_tracked(&task));
    assert_eq!(tracker.state(&task), None);
    assert!(tracker.start_time(&task).is_none());
    assert!(!tracker.is_pending(&task));
    assert!(tracker.result(&task).is_some());
}

#[test]
fn clear_tracking_leaves_guard_sets_alone() {
    let tracker = Tracker::new();
    let task = id("x");
    tracker.mark_cancelled(&task);
    tracker.mark_stopping(&task);
    tracker.clear_tracking(&task);
    assert!(tracker.is_cancelled(&task));
    assert!(tracker.is_stopping(&task));
}
