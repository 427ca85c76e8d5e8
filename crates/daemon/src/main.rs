// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opsboard Daemon (obd)
//!
//! Background process that owns the task orchestration engine and
//! serves the view over a unix socket.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use fs2::FileExt;
use ob_adapters::{DesktopNotifyAdapter, TmuxHost, TmuxTerminals};
use ob_core::SystemClock;
use ob_daemon::docs::DocLoader;
use ob_daemon::{Dispatcher, HostMonitor, ListenCtx, Listener, LogBuffer};
use ob_engine::{EngineConfig, EngineDeps, Orchestrator};
use ob_storage::{FileKvStore, Persistence};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, Notify};
use tracing::{error, info};

/// Rotate the log when it exceeds this size
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("obd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("obd {}", env!("CARGO_PKG_VERSION"));
                println!("Opsboard Daemon - task orchestration engine behind the panel view");
                println!();
                println!("USAGE:");
                println!("    obd");
                println!();
                println!("The daemon listens on a Unix socket for view connections. Paths");
                println!("come from OPSBOARD_STATE_DIR, OPSBOARD_SOCKET, and");
                println!("OPSBOARD_WORKSPACE (default: current directory).");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: obd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let state_dir = ob_daemon::env::state_dir().ok_or("cannot resolve a state directory")?;
    std::fs::create_dir_all(&state_dir)?;
    let workspace_root = ob_daemon::env::workspace_root();
    let socket_path = ob_daemon::env::socket_path(&state_dir);
    let log_path = state_dir.join("obd.log");

    rotate_log_if_needed(&log_path);
    let logbuf = LogBuffer::new();
    let _log_guard = setup_logging(&log_path, &logbuf)?;

    // Single daemon instance per state dir
    let lock_path = state_dir.join("obd.lock");
    let lock_file = std::fs::File::create(&lock_path)?;
    if lock_file.try_lock_exclusive().is_err() {
        eprintln!("obd is already running (lock: {})", lock_path.display());
        std::process::exit(1);
    }

    info!(workspace = %workspace_root.display(), "starting daemon");

    // Persistence: one global store, one per-workspace store
    let persistence = Arc::new(Persistence::new(
        Arc::new(FileKvStore::new(state_dir.join("global.json"))),
        Arc::new(FileKvStore::new(workspace_store_path(
            &state_dir,
            &workspace_root,
        ))),
    ));

    // Engine wiring
    let host = TmuxHost::new(workspace_root.clone());
    let (view_tx, view_rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(Orchestrator::new(
        EngineDeps {
            host: host.clone(),
            terminals: TmuxTerminals::new(),
            notifier: DesktopNotifyAdapter::new(),
            persistence,
        },
        SystemClock,
        EngineConfig {
            workspace_root: workspace_root.clone(),
        },
        view_tx,
    ));

    // View surface
    let dispatcher = Dispatcher::new(
        Arc::clone(&orchestrator),
        DocLoader::new(workspace_root.join("docs")),
        logbuf,
    );
    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx::new(dispatcher, Arc::clone(&shutdown)));
    ctx.spawn_pump(view_rx);

    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let socket = tokio::net::UnixListener::bind(&socket_path)?;
    tokio::spawn(Listener::new(socket, Arc::clone(&ctx)).run());

    // Host event source
    tokio::spawn(HostMonitor::new(Arc::clone(&orchestrator), host).run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %socket_path.display(), "daemon ready");
    println!("READY");

    tokio::select! {
        _ = shutdown.notified() => {
            info!("shutdown requested via command, stopping running tasks");
            orchestrator.stop_all().await;
        }
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    if let Err(e) = std::fs::remove_file(&socket_path) {
        error!(error = %e, "failed to remove socket");
    }
    info!("daemon stopped");
    Ok(())
}

/// Per-workspace store file, keyed by a filesystem-safe workspace name.
fn workspace_store_path(state_dir: &Path, workspace_root: &Path) -> PathBuf {
    let key: String = workspace_root
        .display()
        .to_string()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    state_dir.join("workspaces").join(format!("{key}.json"))
}

/// Rotate the log file when it has grown too large. Best-effort:
/// rotation failures must not keep the daemon from starting.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }
    let _ = std::fs::rename(log_path, format!("{}.1", log_path.display()));
}

/// File appender plus the in-process ring buffer behind `getLogBuffer`.
fn setup_logging(
    log_path: &Path,
    logbuf: &LogBuffer,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let parent = log_path.parent().ok_or("log path has no parent")?;
    std::fs::create_dir_all(parent)?;
    let file_name = log_path.file_name().ok_or("log path has no file name")?;

    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .with(
            fmt::layer()
                .compact()
                .with_ansi(false)
                .with_writer(logbuf.clone()),
        )
        .init();

    Ok(guard)
}
