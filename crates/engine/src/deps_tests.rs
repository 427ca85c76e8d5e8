// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ob_core::test_support::{task_with_deps, task_with_sequence_deps, workspace_task};
use ob_core::DependsOrder;
use std::path::Path;
use tempfile::tempdir;

fn write_config(root: &Path, content: &str) {
    let dir = root.join(".opsboard");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("tasks.json"), content).unwrap();
}

#[test]
fn metadata_deps_take_priority() {
    let dir = tempdir().unwrap();
    write_config(
        dir.path(),
        r#"{"tasks": [{"label": "build", "dependsOn": ["from-config"]}]}"#,
    );
    let reader = DepsReader::new(dir.path().to_path_buf());
    let task = task_with_deps("build", &["from-metadata"]);
    assert_eq!(reader.read(&task).deps, vec!["from-metadata"]);
}

#[test]
fn config_file_consulted_when_metadata_silent() {
    let dir = tempdir().unwrap();
    write_config(
        dir.path(),
        r#"{
            // comment-tolerant
            "tasks": [
                {
                    "label": "build",
                    "dependsOn": ["compile", { "label": "codegen" }, {}],
                    "dependsOrder": "sequence",
                },
            ],
        }"#,
    );
    let reader = DepsReader::new(dir.path().to_path_buf());
    let deps = reader.read(&workspace_task("build"));
    // The empty object normalizes away
    assert_eq!(deps.deps, vec!["compile", "codegen"]);
    assert_eq!(deps.order, DependsOrder::Sequence);
}

#[test]
fn missing_config_file_yields_no_deps() {
    let dir = tempdir().unwrap();
    let reader = DepsReader::new(dir.path().to_path_buf());
    let deps = reader.read(&workspace_task("build"));
    assert!(deps.deps.is_empty());
    assert_eq!(deps.order, DependsOrder::Parallel);
}

#[test]
fn unparseable_config_degrades_to_no_deps() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), "{ this is not json");
    let reader = DepsReader::new(dir.path().to_path_buf());
    let deps = reader.read(&workspace_task("build"));
    assert!(deps.deps.is_empty());
    assert_eq!(deps.order, DependsOrder::Parallel);
}

#[test]
fn unknown_label_yields_no_deps() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), r#"{"tasks": [{"label": "other"}]}"#);
    let reader = DepsReader::new(dir.path().to_path_buf());
    assert!(reader.read(&workspace_task("build")).deps.is_empty());
}

#[test]
fn metadata_sequence_order_passes_through() {
    let dir = tempdir().unwrap();
    let reader = DepsReader::new(dir.path().to_path_buf());
    let task = task_with_sequence_deps("deploy", &["build", "test"]);
    let deps = reader.read(&task);
    assert_eq!(deps.deps, vec!["build", "test"]);
    assert_eq!(deps.order, DependsOrder::Sequence);
}
