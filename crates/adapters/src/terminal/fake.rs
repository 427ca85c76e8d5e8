// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake terminal adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{TerminalAdapter, TerminalError, TerminalInfo};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded terminal call
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalCall {
    List,
    Interrupt { name: String },
    Dispose { name: String },
    Reveal { name: String },
}

struct FakeTerminalState {
    terminals: Vec<String>,
    calls: Vec<TerminalCall>,
}

/// Fake terminal adapter for testing
#[derive(Clone)]
pub struct FakeTerminals {
    inner: Arc<Mutex<FakeTerminalState>>,
}

impl Default for FakeTerminals {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeTerminalState {
                terminals: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeTerminals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live terminal by display name
    pub fn add(&self, name: &str) {
        self.inner.lock().terminals.push(name.to_string());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TerminalCall> {
        self.inner.lock().calls.clone()
    }

    /// Names disposed so far
    pub fn disposed(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                TerminalCall::Dispose { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names still alive
    pub fn alive(&self) -> Vec<String> {
        self.inner.lock().terminals.clone()
    }
}

#[async_trait]
impl TerminalAdapter for FakeTerminals {
    async fn list(&self) -> Vec<TerminalInfo> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::List);
        inner
            .terminals
            .iter()
            .map(|name| TerminalInfo { name: name.clone() })
            .collect()
    }

    async fn interrupt(&self, name: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::Interrupt {
            name: name.to_string(),
        });
        if !inner.terminals.iter().any(|t| t == name) {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn dispose(&self, name: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::Dispose {
            name: name.to_string(),
        });
        let before = inner.terminals.len();
        inner.terminals.retain(|t| t != name);
        if inner.terminals.len() == before {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn reveal(&self, name: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::Reveal {
            name: name.to_string(),
        });
        if !inner.terminals.iter().any(|t| t == name) {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
