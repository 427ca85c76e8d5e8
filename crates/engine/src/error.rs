// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use thiserror::Error;

/// Errors raised inside the engine.
///
/// These never escape the engine boundary: entry points catch them, log,
/// and surface outcomes through notifications and view messages only.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("host call failed: {0}")]
    Host(#[from] ob_adapters::HostError),
}
