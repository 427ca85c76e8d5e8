// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// --- TaskSource tests ---

#[yare::parameterized(
    workspace = { "workspace", TaskSource::Workspace },
    npm       = { "npm", TaskSource::Npm },
    shell     = { "shell", TaskSource::Other("shell".into()) },
)]
fn source_parse(input: &str, expected: TaskSource) {
    assert_eq!(TaskSource::parse(input), expected);
    assert_eq!(TaskSource::parse(input).as_str(), input);
}

#[test]
fn source_serde_is_plain_string() {
    let json = serde_json::to_string(&TaskSource::Npm).unwrap();
    assert_eq!(json, "\"npm\"");
    let back: TaskSource = serde_json::from_str("\"gulp\"").unwrap();
    assert_eq!(back, TaskSource::Other("gulp".into()));
}

// --- HostTask tests ---

#[test]
fn id_is_source_and_name() {
    let task = HostTask::new(TaskSource::Npm, "watch");
    assert_eq!(task.id().as_str(), "npm|watch");
}

#[test]
fn display_label_bare_for_workspace() {
    let task = HostTask::new(TaskSource::Workspace, "build");
    assert_eq!(task.display_label(), "build");
}

#[test]
fn display_label_prefixed_for_other_sources() {
    let task = HostTask::new(TaskSource::Npm, "watch");
    assert_eq!(task.display_label(), "npm: watch");
}

#[test]
fn depends_order_defaults_to_parallel() {
    let deps: TaskDependencies = serde_json::from_str(r#"{"deps": ["a", "b"]}"#).unwrap();
    assert_eq!(deps.order, DependsOrder::Parallel);
    assert_eq!(deps.deps, vec!["a", "b"]);
}

#[test]
fn depends_order_serde_lowercase() {
    assert_eq!(
        serde_json::to_string(&DependsOrder::Sequence).unwrap(),
        "\"sequence\""
    );
}

#[test]
fn host_task_roundtrip_preserves_metadata() {
    let mut task = HostTask::new(TaskSource::Workspace, "build");
    task.definition_path = Some("/ws/.opsboard/tasks.json".into());
    task.depends_on = Some(TaskDependencies {
        deps: vec!["compile".into()],
        order: DependsOrder::Sequence,
    });
    let json = serde_json::to_string(&task).unwrap();
    let back: HostTask = serde_json::from_str(&json).unwrap();
    assert_eq!(back, task);
}
