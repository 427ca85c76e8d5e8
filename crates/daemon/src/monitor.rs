// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host execution monitor
//!
//! The tmux host has no event callbacks, so the daemon polls its active
//! executions and synthesizes start/end events from the diff. Exit codes
//! are not observable after a session is gone; ends are reported without
//! one.

use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{Clock, HostTask, TaskId};
use ob_engine::{EndEvent, Orchestrator, StartEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default poll interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Polls the host and feeds lifecycle events into the orchestrator.
pub struct HostMonitor<H, T, N, C: Clock> {
    orchestrator: Arc<Orchestrator<H, T, N, C>>,
    host: H,
    interval: Duration,
}

impl<H, T, N, C> HostMonitor<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(orchestrator: Arc<Orchestrator<H, T, N, C>>, host: H) -> Self {
        Self {
            orchestrator,
            host,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until the orchestrator is dropped by everyone else.
    pub async fn run(self) {
        let mut known: HashMap<TaskId, HostTask> = HashMap::new();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let active = self.host.active_executions().await;
            let mut seen: HashMap<TaskId, HostTask> = HashMap::new();

            for execution in &active {
                let id = execution.task.id();
                seen.insert(id.clone(), execution.task.clone());
                if !known.contains_key(&id) {
                    self.orchestrator
                        .on_task_start(StartEvent::new(
                            execution.task.clone(),
                            Arc::clone(&execution.handle),
                        ))
                        .await;
                }
            }

            for (id, task) in known.drain() {
                if !seen.contains_key(&id) {
                    self.orchestrator
                        .on_task_end(EndEvent::new(task, None))
                        .await;
                }
            }

            known = seen;
        }
    }
}
