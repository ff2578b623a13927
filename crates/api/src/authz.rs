//! API-side authorization helpers.
//!
//! Every protected handler resolves its caller here before touching the
//! store, so guard decisions always precede mutations.

use chrono::Utc;

use jobly_auth::{Principal, PrincipalKind, Requirement};
use jobly_core::{Handle, Username};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::BearerToken;

/// Verify the request's token and check it against `required`.
pub fn require(
    services: &AppServices,
    token: &BearerToken,
    required: Requirement<'_>,
) -> Result<Principal, ApiError> {
    Ok(services.guard.check(token.as_deref(), &required, Utc::now())?)
}

/// Any verified company; returns its handle.
pub fn require_company(services: &AppServices, token: &BearerToken) -> Result<Handle, ApiError> {
    let principal = require(services, token, Requirement::AnyOf(PrincipalKind::Company))?;
    principal
        .as_company()
        .cloned()
        .ok_or_else(|| ApiError::Forbidden("requires a company token".to_string()))
}

/// Any verified user; returns its username.
pub fn require_user(services: &AppServices, token: &BearerToken) -> Result<Username, ApiError> {
    let principal = require(services, token, Requirement::AnyOf(PrincipalKind::User))?;
    principal
        .as_user()
        .cloned()
        .ok_or_else(|| ApiError::Forbidden("requires a user token".to_string()))
}
