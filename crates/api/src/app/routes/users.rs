use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};

use jobly_auth::{PrincipalKind, Requirement};
use jobly_core::{validate_password, NewUser, User, UserPatch};

use crate::app::dto::{MessageResponse, UpdateUserRequest, UserDetail, UserSignupRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{username_from_path, ApiJson};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::BearerToken;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route(
            "/:username",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<UserSignupRequest>,
) -> ApiResult<Json<User>> {
    validate_password(&body.password)?;
    let mut new = NewUser {
        username: body.username,
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        photo: body.photo,
        current_company: body.current_company,
        password_hash: String::new(),
    };
    new.validate()?;
    new.password_hash = services.hash_password(body.password).await?;

    let user = services.store.insert_user(new).await?;
    tracing::info!(username = %user.username, "user signed up");
    Ok(Json(user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> ApiResult<Json<Vec<User>>> {
    require(&services, &token, Requirement::AnyOf(PrincipalKind::User))?;
    let users = services.store.list_users().await?;
    Ok(Json(users))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserDetail>> {
    require(&services, &token, Requirement::AnyOf(PrincipalKind::User))?;
    let username = username_from_path(&username)?;

    let user = services
        .store
        .get_user(&username)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no user: {username}")))?;
    let applications = services
        .store
        .list_applications_for_user(&username)
        .await?
        .into_iter()
        .map(|a| a.job_id)
        .collect();

    Ok(Json(UserDetail { user, applications }))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(username): Path<String>,
    body: Result<ApiJson<UpdateUserRequest>, ApiError>,
) -> ApiResult<Json<User>> {
    require(&services, &token, Requirement::owner(PrincipalKind::User, &username))?;
    let username = username_from_path(&username)?;
    let ApiJson(body) = body?;

    if body.username.as_deref().is_some_and(|u| u != username.as_str()) {
        return Err(ApiError::validation("username cannot be changed"));
    }
    if let Some(password) = &body.password {
        validate_password(password)?;
    }
    let mut patch = UserPatch {
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        photo: body.photo,
        current_company: body.current_company,
        password_hash: None,
    };
    if patch.is_empty() && body.password.is_none() {
        return Err(ApiError::validation("no fields to update"));
    }
    patch.validate()?;
    if let Some(password) = body.password {
        patch.password_hash = Some(services.hash_password(password).await?);
    }

    let user = services
        .store
        .update_user(&username, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no user: {username}")))?;
    Ok(Json(user))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(username): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&services, &token, Requirement::owner(PrincipalKind::User, &username))?;
    let username = username_from_path(&username)?;

    if !services.store.delete_user(&username).await? {
        return Err(ApiError::not_found(format!("no user: {username}")));
    }
    tracing::info!(username = %username, "user deleted");
    Ok(Json(MessageResponse::new("Deleted user!")))
}
