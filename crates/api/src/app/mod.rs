//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, hasher and token wiring shared by every handler
//! - `routes/`: HTTP routes + handlers (one file per resource family)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: services::AppServices) -> Router {
    let services = Arc::new(services);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .fallback(|| async {
            errors::json_error(axum::http::StatusCode::NOT_FOUND, "not_found", "no such route")
        })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(services))
                .layer(axum::middleware::from_fn(middleware::auth_middleware)),
        )
}
