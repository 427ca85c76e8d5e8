// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Resolve state directory: OPSBOARD_STATE_DIR > XDG_STATE_HOME/opsboard
/// > ~/.local/state/opsboard
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("OPSBOARD_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("opsboard"));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".local/state/opsboard"))
}

/// Socket path override: OPSBOARD_SOCKET > <state_dir>/obd.sock
pub fn socket_path(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("OPSBOARD_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir.join("obd.sock"))
}

/// Workspace root: OPSBOARD_WORKSPACE > current directory
pub fn workspace_root() -> PathBuf {
    std::env::var("OPSBOARD_WORKSPACE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Editor used by openTaskDefinition: OPSBOARD_EDITOR > VISUAL > EDITOR
pub fn editor() -> Option<String> {
    ["OPSBOARD_EDITOR", "VISUAL", "EDITOR"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
