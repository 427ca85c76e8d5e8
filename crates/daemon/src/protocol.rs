// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! View IPC protocol.
//!
//! Inbound frames are [`Request`]s: a small control vocabulary plus the
//! engine's full [`Command`] set. Outbound traffic is the engine's
//! [`ob_core::ViewMessage`] stream, with control acks ([`Response`])
//! interleaved on the same wire; type tags never collide.

use ob_core::Command;
use serde::{Deserialize, Serialize};

/// Inbound frame from the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Stop every running tree and exit the daemon
    Shutdown,

    /// Any engine command
    #[serde(untagged)]
    Command(Command),
}

/// Control acks from daemon to view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    Pong,

    Hello { version: String },

    ShuttingDown,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
