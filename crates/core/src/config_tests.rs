// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_commented_config() {
    let content = r#"{
        // build pipeline
        "tasks": [
            {
                "label": "build",
                "command": "make build",
                "dependsOn": ["compile", { "label": "codegen" }, { "task": "lint" }],
                "dependsOrder": "sequence", /* deps run one by one */
            },
        ],
    }"#;
    let file = WorkspaceTasksFile::parse(content).unwrap();
    let build = file.get("build").unwrap();
    assert_eq!(build.command.as_deref(), Some("make build"));
    assert_eq!(build.depends_order, DependsOrder::Sequence);
    let names: Vec<_> = build.depends_on.iter().filter_map(|d| d.name()).collect();
    assert_eq!(names, vec!["compile", "codegen", "lint"]);
}

#[test]
fn dependency_ref_empty_object_has_no_name() {
    let dep: DependencyRef = serde_json::from_str("{}").unwrap();
    assert_eq!(dep.name(), None);
}

#[test]
fn dependency_ref_prefers_label_over_task() {
    let dep: DependencyRef =
        serde_json::from_str(r#"{"label": "a", "task": "b"}"#).unwrap();
    assert_eq!(dep.name(), Some("a"));
}

#[test]
fn get_unknown_label_is_none() {
    let file = WorkspaceTasksFile::default();
    assert!(file.get("nope").is_none());
}

#[test]
fn depends_on_defaults_empty() {
    let file = WorkspaceTasksFile::parse(r#"{"tasks": [{"label": "solo"}]}"#).unwrap();
    assert!(file.get("solo").unwrap().depends_on.is_empty());
    assert_eq!(
        file.get("solo").unwrap().depends_order,
        DependsOrder::Parallel
    );
}
