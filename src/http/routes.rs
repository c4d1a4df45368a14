//! Axum router configuration

use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::ServerState;

use super::middleware::access_log;

/// Create the Axum router.
///
/// Every path falls through to `ServeDir`, which owns MIME detection,
/// conditional requests, byte ranges, the `index.html` directory fallback,
/// and 404/405 generation. `ServeDir` also rejects any path whose
/// normalized form would escape the content root, so traversal requests
/// never reach the filesystem outside it.
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(&state.content_root))
        .layer(middleware::from_fn_with_state(state.clone(), access_log))
        .layer(TraceLayer::new_for_http())
}
