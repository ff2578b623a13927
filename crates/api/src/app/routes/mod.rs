use axum::{routing::post, Router};

pub mod auth;
pub mod common;
pub mod companies;
pub mod jobs;
pub mod system;
pub mod users;

/// Router for the resource endpoints. Each handler applies its own guard
/// requirement; signup and credential exchange are public.
pub fn router() -> Router {
    Router::new()
        .route("/company-auth", post(auth::company_auth))
        .route("/user-auth", post(auth::user_auth))
        .nest("/companies", companies::router())
        .nest("/users", users::router())
        .nest("/jobs", jobs::router())
}
