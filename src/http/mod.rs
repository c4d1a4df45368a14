//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router delegating all paths to the static file service
//! - Access log middleware recording one line per completed request
//! - Response body observer counting the bytes actually written

pub mod middleware;
pub mod observe;
pub mod routes;

pub use routes::create_router;
