// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ob_core::TaskId;

fn result(exit_code: i32) -> ob_core::TaskResult {
    ob_core::TaskResult::from_exit(exit_code, 1_000, 10, vec![], None)
}

#[test]
fn legacy_entries_are_merged() {
    let mut completed = HashMap::new();
    let mut legacy = HashMap::new();
    legacy.insert(TaskId::new("workspace|a"), result(1));
    merge_legacy_completions(&mut completed, legacy);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[&TaskId::new("workspace|a")].exit_code, 1);
}

#[test]
fn existing_completion_wins_on_collision() {
    let id = TaskId::new("workspace|a");
    let mut completed = HashMap::new();
    completed.insert(id.clone(), result(0));
    let mut legacy = HashMap::new();
    legacy.insert(id.clone(), result(1));
    merge_legacy_completions(&mut completed, legacy);
    assert_eq!(completed[&id].exit_code, 0);
}

#[test]
fn empty_legacy_is_noop() {
    let mut completed = HashMap::new();
    completed.insert(TaskId::new("workspace|a"), result(0));
    merge_legacy_completions(&mut completed, HashMap::new());
    assert_eq!(completed.len(), 1);
}
