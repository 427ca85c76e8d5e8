// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ob-daemon: view-facing IPC surface for the Opsboard engine

pub mod dispatcher;
pub mod docs;
pub mod env;
pub mod listener;
pub mod logbuf;
pub mod monitor;
pub mod nav;
pub mod protocol;
pub mod wire;

pub use dispatcher::Dispatcher;
pub use listener::{ListenCtx, Listener};
pub use logbuf::LogBuffer;
pub use monitor::HostMonitor;
pub use protocol::{Request, Response};
