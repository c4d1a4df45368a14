//! HTTP middleware
//!
//! Access logging: capture the request line and start time on the way in,
//! then wrap the response body so the final status and byte count are logged
//! when the response has actually been written out.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Local;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::access_log::LogEntry;
use crate::http::observe::CountingBody;
use crate::state::ServerState;

/// Access log middleware.
pub async fn access_log(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    // ConnectInfo is absent when the router is driven without a real
    // listener (tests); log "-" for the remote in that case.
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let protocol = request.version();
    let start_time = Local::now();

    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let entry = LogEntry {
        remote_addr,
        method,
        path,
        protocol,
        status: parts.status,
        bytes: 0,
        start_time,
    };
    let body = Body::new(CountingBody::new(body, entry, state.access_log.clone()));
    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_log::test_support::SharedBuf;
    use crate::access_log::AccessLog;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::util::ServiceExt;

    fn test_router(buf: SharedBuf) -> Router {
        let state = Arc::new(ServerState {
            content_root: std::env::temp_dir(),
            access_log: Arc::new(AccessLog::from_writer(buf)),
        });
        Router::new()
            .route("/hello", get(|| async { "hi" }))
            .layer(axum::middleware::from_fn_with_state(state, access_log))
    }

    #[tokio::test]
    async fn test_one_line_per_request() {
        let buf = SharedBuf::default();
        let app = test_router(buf.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/hello")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let contents = buf.contents();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("\"GET /hello HTTP/1.1\" 200 2"));
        assert!(contents.starts_with("- - - ["));
    }

    #[tokio::test]
    async fn test_status_of_missing_route_is_logged() {
        let buf = SharedBuf::default();
        let app = test_router(buf.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nothing-here")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        assert!(buf.contents().contains("\"GET /nothing-here HTTP/1.1\" 404"));
    }
}
