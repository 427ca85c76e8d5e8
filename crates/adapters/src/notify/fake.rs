// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError, NotifyLevel};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded notification
#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub level: NotifyLevel,
    pub message: String,
}

/// Fake notification adapter for testing
#[derive(Clone)]
pub struct FakeNotifyAdapter {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
}

impl Default for FakeNotifyAdapter {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().clone()
    }

    /// Messages recorded at the given level
    pub fn messages_at(&self, level: NotifyLevel) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.level == level)
            .map(|c| c.message.clone())
            .collect()
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(&self, level: NotifyLevel, message: &str) -> Result<(), NotifyError> {
        self.calls.lock().push(NotifyCall {
            level,
            message: message.to_string(),
        });
        Ok(())
    }
}
