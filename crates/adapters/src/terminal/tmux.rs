// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux terminal adapter

use super::{TerminalAdapter, TerminalError, TerminalInfo};
use async_trait::async_trait;
use tokio::process::Command;

/// Terminal adapter over tmux sessions.
#[derive(Clone, Copy, Default)]
pub struct TmuxTerminals;

impl TmuxTerminals {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TerminalAdapter for TmuxTerminals {
    async fn list(&self) -> Vec<TerminalInfo> {
        let output = Command::new("tmux")
            .args(["list-sessions", "-F", "#{session_name}"])
            .output()
            .await;

        match output {
            Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout)
                .lines()
                .filter(|l| !l.is_empty())
                .map(|l| TerminalInfo {
                    name: l.to_string(),
                })
                .collect(),
            // No server running means no terminals, not an error
            _ => Vec::new(),
        }
    }

    async fn interrupt(&self, name: &str) -> Result<(), TerminalError> {
        let output = Command::new("tmux")
            .args(["send-keys", "-t", name, "C-c"])
            .output()
            .await
            .map_err(|e| TerminalError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn dispose(&self, name: &str) -> Result<(), TerminalError> {
        let output = Command::new("tmux")
            .args(["kill-session", "-t", name])
            .output()
            .await
            .map_err(|e| TerminalError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TerminalError::CommandFailed(stderr.to_string()));
        }
        Ok(())
    }

    async fn reveal(&self, name: &str) -> Result<(), TerminalError> {
        // Best we can do headlessly: switch the most recent client to it
        let output = Command::new("tmux")
            .args(["switch-client", "-t", name])
            .output()
            .await
            .map_err(|e| TerminalError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }
}
