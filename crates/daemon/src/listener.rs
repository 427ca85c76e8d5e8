// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for view socket I/O.
//!
//! Accepts connections and handles each in a spawned task. A connection
//! is long-lived: command frames stream in, the engine's outbound
//! message stream fans out to every connected view.

use crate::dispatcher::Dispatcher;
use crate::protocol::{Request, Response};
use crate::wire::{self, WireError, DEFAULT_TIMEOUT, PROTOCOL_VERSION};
use ob_adapters::{NotifyAdapter, TaskHost, TerminalAdapter};
use ob_core::{Clock, ViewMessage};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, Notify};
use tracing::{debug, error, warn};

/// Fan-out buffer per connection; a view that stops reading loses the
/// oldest messages, then resyncs with `ready`.
const BROADCAST_CAP: usize = 1024;

/// Shared daemon context for all connections.
pub struct ListenCtx<H, T, N, C: Clock> {
    pub dispatcher: Dispatcher<H, T, N, C>,
    pub messages: broadcast::Sender<ViewMessage>,
    pub shutdown: Arc<Notify>,
}

impl<H, T, N, C> ListenCtx<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(dispatcher: Dispatcher<H, T, N, C>, shutdown: Arc<Notify>) -> Self {
        let (messages, _) = broadcast::channel(BROADCAST_CAP);
        Self {
            dispatcher,
            messages,
            shutdown,
        }
    }

    /// Pump the engine's outbound channel into the per-connection fan-out.
    pub fn spawn_pump(self: &Arc<Self>, mut view_rx: mpsc::UnboundedReceiver<ViewMessage>) {
        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(msg) = view_rx.recv().await {
                // No subscribers is fine; emission is fire-and-forget
                let _ = ctx.messages.send(msg);
            }
        });
    }
}

/// Listener task accepting view connections.
pub struct Listener<H, T, N, C: Clock> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<H, T, N, C>>,
}

impl<H, T, N, C> Listener<H, T, N, C>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx<H, T, N, C>>) -> Self {
        Self { socket, ctx }
    }

    /// Run the accept loop until the daemon shuts down.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        match handle_connection(stream, &ctx).await {
                            Ok(()) | Err(WireError::ConnectionClosed) => {
                                debug!("view disconnected");
                            }
                            Err(WireError::Timeout) => warn!("connection timeout"),
                            Err(e) => error!(error = %e, "connection error"),
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                }
            }
        }
    }
}

/// Handle a single view connection until it closes.
async fn handle_connection<H, T, N, C>(
    stream: UnixStream,
    ctx: &ListenCtx<H, T, N, C>,
) -> Result<(), WireError>
where
    H: TaskHost,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let (mut reader, mut writer) = stream.into_split();
    let mut messages = ctx.messages.subscribe();

    loop {
        tokio::select! {
            frame = wire::read_message(&mut reader) => {
                let request: Request = wire::decode(&frame?)?;
                debug!(request = ?request, "received request");
                match request {
                    Request::Ping => {
                        wire::write_frame(&mut writer, &Response::Pong, DEFAULT_TIMEOUT).await?;
                    }
                    Request::Hello { version } => {
                        if version != PROTOCOL_VERSION {
                            warn!(view = version, daemon = PROTOCOL_VERSION, "version skew");
                        }
                        wire::write_frame(
                            &mut writer,
                            &Response::Hello { version: PROTOCOL_VERSION.to_string() },
                            DEFAULT_TIMEOUT,
                        )
                        .await?;
                    }
                    Request::Shutdown => {
                        wire::write_frame(&mut writer, &Response::ShuttingDown, DEFAULT_TIMEOUT)
                            .await?;
                        ctx.shutdown.notify_one();
                    }
                    Request::Command(command) => {
                        ctx.dispatcher.handle(command).await;
                    }
                }
            }

            msg = messages.recv() => {
                match msg {
                    Ok(msg) => {
                        wire::write_frame(&mut writer, &msg, DEFAULT_TIMEOUT).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "view fell behind, messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }
        }
    }
}
