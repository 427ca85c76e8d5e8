// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ob-storage: key/value persistence for the Opsboard engine

pub mod kv;
pub mod migration;
pub mod persist;

pub use kv::{FileKvStore, KvStore, MemoryKvStore, StorageError};
pub use persist::{
    Persistence, TaskHistory, EXECUTION_HISTORY_CAP, NAV_CAP, RECENTS_CAP, STARS_CAP,
    TASK_HISTORY_WINDOW,
};
