// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification adapter using notify-rust.

use super::{NotifyAdapter, NotifyError, NotifyLevel};
use async_trait::async_trait;

#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotifyAdapter;

impl DesktopNotifyAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn notify(&self, level: NotifyLevel, message: &str) -> Result<(), NotifyError> {
        let title = match level {
            NotifyLevel::Info => "Opsboard",
            NotifyLevel::Warn => "Opsboard warning",
            NotifyLevel::Error => "Opsboard error",
        };
        let message = message.to_string();
        // Notification::show() can block on some platforms. Fire-and-forget
        // on tokio's bounded blocking thread pool to keep the runtime free.
        tokio::task::spawn_blocking(move || {
            match notify_rust::Notification::new()
                .summary(title)
                .body(&message)
                .show()
            {
                Ok(_) => {
                    tracing::debug!(title, "desktop notification sent");
                }
                Err(e) => {
                    tracing::warn!(title, error = %e, "desktop notification failed");
                }
            }
        });
        Ok(())
    }
}
