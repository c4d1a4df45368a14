//! Static file server
//!
//! One [`FileServer`] per configured listen address. Construction validates
//! the content directory; [`FileServer::bind`] binds the listener and
//! [`BoundServer::serve`] runs until the shared shutdown signal fires, then
//! drains in-flight requests for a bounded grace period.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::access_log::AccessLog;
use crate::error::{Result, SimpletonError};
use crate::http::create_router;
use crate::state::ServerState;

/// Grace period for in-flight requests once shutdown is triggered.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A static file server bound to one listen address.
pub struct FileServer {
    listen_addr: String,
    content_root: PathBuf,
    access_log: Arc<AccessLog>,
}

impl FileServer {
    /// Create a server for one listen address.
    ///
    /// Resolves `content_dir` to an absolute path once, up front, and
    /// verifies it is an existing directory. Fails with an I/O error if the
    /// path cannot be resolved and with `NotADirectory` if it resolves to
    /// anything but a directory. The access log defaults to stdout until
    /// replaced via [`FileServer::with_access_log`].
    pub fn new(listen_addr: impl Into<String>, content_dir: impl AsRef<Path>) -> Result<Self> {
        let content_root = content_dir.as_ref().canonicalize()?;
        if !std::fs::metadata(&content_root)?.is_dir() {
            return Err(SimpletonError::NotADirectory(content_root));
        }

        Ok(Self {
            listen_addr: listen_addr.into(),
            content_root,
            access_log: Arc::new(AccessLog::stdout()),
        })
    }

    /// Replace the access log sink. Must happen before serving begins.
    pub fn with_access_log(mut self, log: Arc<AccessLog>) -> Self {
        self.access_log = log;
        self
    }

    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Bind the listen address and build the router.
    pub async fn bind(self) -> Result<BoundServer> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        let state = Arc::new(ServerState {
            content_root: self.content_root,
            access_log: self.access_log,
        });

        Ok(BoundServer {
            listener,
            local_addr,
            router: create_router(state),
        })
    }
}

/// A bound listener, ready to serve.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl BoundServer {
    /// The actual bound address (resolves port 0 to the assigned port).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    ///
    /// After the signal, no new connections are accepted; connections that
    /// have not finished within [`SHUTDOWN_TIMEOUT`] are closed forcibly.
    pub async fn serve(self, shutdown: watch::Receiver<()>) -> Result<()> {
        let addr = self.local_addr;
        tracing::info!("serving on {}", addr);

        let mut drain = shutdown.clone();
        let mut trigger = shutdown;
        let server = axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            // A closed channel means the orchestrator is gone; treat it as
            // a shutdown signal too.
            let _ = trigger.changed().await;
        });

        tokio::select! {
            res = server => {
                res?;
                tracing::info!("server on {} stopped", addr);
            }
            _ = async {
                let _ = drain.changed().await;
                tokio::time::sleep(SHUTDOWN_TIMEOUT).await;
            } => {
                tracing::warn!(
                    "graceful shutdown timed out on {}, closing remaining connections",
                    addr
                );
            }
        }
        Ok(())
    }
}
