//! Simpleton
//!
//! A minimal static file HTTP server: serves one content directory on one
//! or more listen addresses, writes an Apache common log format access log,
//! and shuts down gracefully on SIGINT/SIGTERM.

mod access_log;
mod config;
mod config_file;
mod error;
mod http;
mod server;
mod state;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::access_log::{open_log_file, AccessLog};
use crate::config::{Cli, Config, LogTarget};
use crate::error::{Result, SimpletonError};
use crate::server::FileServer;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "simpleton";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::resolve(cli) {
        Ok(Some(config)) => config,
        Ok(None) => {
            // No content directory given anywhere: print usage, exit clean.
            let _ = Cli::command().print_help();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{APP_NAME}: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.error_log) {
        eprintln!("{APP_NAME}: failed to open error log: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("{} v{} starting", APP_NAME, VERSION);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Start every configured listener, wait for a termination signal, then
/// shut all of them down and wait until each one has stopped.
async fn run(config: Config) -> Result<()> {
    let access_log = Arc::new(AccessLog::open(&config.access_log)?);

    let content_dir = if config.chroot {
        enter_chroot(&config.content_dir)?;
        tracing::info!("chrooted into {}", config.content_dir.display());
        PathBuf::from("/")
    } else {
        config.content_dir.clone()
    };

    // Content directory validation is fatal; it would fail identically for
    // every listener.
    let mut servers = Vec::new();
    for addr in &config.listen_addrs {
        let server = FileServer::new(addr, &content_dir)?.with_access_log(access_log.clone());
        servers.push(server);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // A bind failure on one address does not stop the others.
    let mut tasks = Vec::new();
    for server in servers {
        let addr = server.listen_addr().to_string();
        match server.bind().await {
            Ok(bound) => tasks.push(tokio::spawn(bound.serve(shutdown_rx.clone()))),
            Err(e) => tracing::error!("failed to start server on {}: {}", addr, e),
        }
    }
    if tasks.is_empty() {
        return Err(SimpletonError::Config(
            "no listeners could be started".to_string(),
        ));
    }

    shutdown_signal().await;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    for task in tasks {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("server error: {}", e),
            Err(e) => tracing::error!("server task failed: {}", e),
        }
    }
    tracing::info!("All servers stopped");
    Ok(())
}

/// Initialize logging with tracing
fn init_logging(target: &LogTarget) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "simpleton=info,tower_http=info".into());

    match target {
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file)),
                )
                .init();
        }
        // `-` on the error log flag means stderr.
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

/// Wait for SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for SIGINT: {}", e);
            // Fall through and shut down rather than run unstoppable.
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}

/// Chroot into `dir` and move the working directory to the new root.
///
/// Requires CAP_SYS_CHROOT; the content root is `/` afterwards.
#[cfg(unix)]
fn enter_chroot(dir: &Path) -> Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let dir = dir.canonicalize()?;
    let path = CString::new(dir.as_os_str().as_bytes())
        .map_err(|_| SimpletonError::Config(format!("invalid chroot path: {}", dir.display())))?;

    if unsafe { libc::chroot(path.as_ptr()) } != 0 {
        return Err(SimpletonError::Chroot(std::io::Error::last_os_error()));
    }
    std::env::set_current_dir("/")?;
    Ok(())
}

#[cfg(not(unix))]
fn enter_chroot(_dir: &Path) -> Result<()> {
    Err(SimpletonError::Config(
        "chroot is not supported on this platform".to_string(),
    ))
}
