//! Shared per-server state.

use std::path::PathBuf;
use std::sync::Arc;

use crate::access_log::AccessLog;

/// State shared by the router and middleware of one server instance.
pub struct ServerState {
    /// Absolute content root all served files live under. Resolved once at
    /// startup, never a relative path during request handling.
    pub content_root: PathBuf,

    /// Access log sink, shared across all requests of this server.
    pub access_log: Arc<AccessLog>,
}
