// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn list_returns_added_terminals() {
    let terminals = FakeTerminals::new();
    terminals.add("Task - build");
    terminals.add("Task - test");
    let listed = terminals.list().await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "Task - build");
}

#[tokio::test]
async fn dispose_removes_terminal() {
    let terminals = FakeTerminals::new();
    terminals.add("Task - build");
    terminals.dispose("Task - build").await.unwrap();
    assert!(terminals.alive().is_empty());
    assert_eq!(terminals.disposed(), vec!["Task - build"]);
}

#[tokio::test]
async fn dispose_unknown_errors() {
    let terminals = FakeTerminals::new();
    assert!(terminals.dispose("nope").await.is_err());
}

#[tokio::test]
async fn interrupt_records_call() {
    let terminals = FakeTerminals::new();
    terminals.add("Task - watch");
    terminals.interrupt("Task - watch").await.unwrap();
    assert!(terminals.calls().contains(&TerminalCall::Interrupt {
        name: "Task - watch".into()
    }));
}

#[tokio::test]
async fn reveal_unknown_errors() {
    let terminals = FakeTerminals::new();
    assert!(terminals.reveal("gone").await.is_err());
}
