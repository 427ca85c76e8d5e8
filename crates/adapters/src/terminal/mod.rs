// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host terminal adapters
//!
//! Terminal display names are the engine's only robust handle on leaked
//! processes: the stop protocol sweeps terminals whose names contain a
//! stopped task's short name when the host's own `terminate()` falls
//! short.

mod tmux;

pub use tmux::TmuxTerminals;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTerminals, TerminalCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from terminal operations
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("terminal not found: {0}")]
    NotFound(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// One host terminal, identified by its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalInfo {
    pub name: String,
}

/// Adapter for enumerating and controlling host terminals
#[async_trait]
pub trait TerminalAdapter: Clone + Send + Sync + 'static {
    /// Enumerate live terminals
    async fn list(&self) -> Vec<TerminalInfo>;

    /// Send a graceful interrupt (Ctrl-C) to a terminal
    async fn interrupt(&self, name: &str) -> Result<(), TerminalError>;

    /// Dispose of a terminal, killing whatever runs inside
    async fn dispose(&self, name: &str) -> Result<(), TerminalError>;

    /// Bring a terminal to the operator's attention
    async fn reveal(&self, name: &str) -> Result<(), TerminalError>;
}
