// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator notification adapters

mod desktop;
mod noop;

pub use desktop::DesktopNotifyAdapter;
pub use noop::NoOpNotifyAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Severity of an operator-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

impl NotifyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyLevel::Info => "info",
            NotifyLevel::Warn => "warn",
            NotifyLevel::Error => "error",
        }
    }
}

/// Adapter for surfacing notifications to the operator
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    /// Send a notification at the given severity
    async fn notify(&self, level: NotifyLevel, message: &str) -> Result<(), NotifyError>;

    async fn info(&self, message: &str) -> Result<(), NotifyError> {
        self.notify(NotifyLevel::Info, message).await
    }

    async fn warn(&self, message: &str) -> Result<(), NotifyError> {
        self.notify(NotifyLevel::Warn, message).await
    }

    async fn error(&self, message: &str) -> Result<(), NotifyError> {
        self.notify(NotifyLevel::Error, message).await
    }
}
