//! Credential exchange: identity + password in, signed token out.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use chrono::Utc;

use jobly_auth::Principal;
use jobly_core::{Handle, Username};

use crate::app::dto::{CompanyAuthRequest, TokenResponse, UserAuthRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::ApiJson;
use crate::app::services::AppServices;

pub async fn company_auth(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CompanyAuthRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let handle = Handle::parse(body.handle).map_err(|_| ApiError::InvalidCredentials)?;
    let company = services
        .store
        .get_company(&handle)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !services.verify_password(body.password, company.password_hash).await? {
        tracing::debug!(handle = %handle, "company password mismatch");
        return Err(ApiError::InvalidCredentials);
    }

    let token = services.tokens.issue(&Principal::company(handle), Utc::now())?;
    Ok(Json(TokenResponse { token }))
}

pub async fn user_auth(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<UserAuthRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let username = Username::parse(body.username).map_err(|_| ApiError::InvalidCredentials)?;
    let user = services
        .store
        .get_user(&username)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !services.verify_password(body.password, user.password_hash).await? {
        tracing::debug!(username = %username, "user password mismatch");
        return Err(ApiError::InvalidCredentials);
    }

    let token = services.tokens.issue(&Principal::user(username), Utc::now())?;
    Ok(Json(TokenResponse { token }))
}
