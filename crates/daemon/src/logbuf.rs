// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process log ring buffer
//!
//! Backs the `getLogBuffer` command. Fed by a `tracing` fmt layer via
//! [`LogBuffer::make_writer`]; keeps the newest lines only.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// Maximum number of retained log lines.
pub const LOG_BUFFER_CAP: usize = 500;

/// Shared ring buffer of recent log lines.
#[derive(Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(LOG_BUFFER_CAP))),
        }
    }
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line, evicting the oldest at capacity.
    pub fn push(&self, line: &str) {
        let mut lines = self.lines.lock();
        if lines.len() == LOG_BUFFER_CAP {
            lines.pop_front();
        }
        lines.push_back(line.to_string());
    }

    /// Snapshot of the buffered lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }
}

/// `io::Write` adapter splitting byte writes into lines.
pub struct LogBufferWriter {
    buffer: LogBuffer,
    partial: Vec<u8>,
}

impl io::Write for LogBufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            self.buffer.push(&text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogBufferWriter {
    fn drop(&mut self) {
        if !self.partial.is_empty() {
            let text = String::from_utf8_lossy(&self.partial).to_string();
            self.buffer.push(&text);
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogBufferWriter {
            buffer: self.clone(),
            partial: Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "logbuf_tests.rs"]
mod tests;
