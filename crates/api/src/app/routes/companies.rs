use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};

use jobly_auth::{PrincipalKind, Requirement};
use jobly_core::{validate_password, Company, CompanyPatch, NewCompany};

use crate::app::dto::{CompanyDetail, CompanySignupRequest, MessageResponse, UpdateCompanyRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{handle_from_path, ApiJson};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::BearerToken;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_company).get(list_companies))
        .route(
            "/:handle",
            get(get_company).patch(update_company).delete(delete_company),
        )
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CompanySignupRequest>,
) -> ApiResult<Json<Company>> {
    validate_password(&body.password)?;
    let mut new = NewCompany {
        handle: body.handle,
        name: body.name,
        logo: body.logo,
        email: body.email,
        password_hash: String::new(),
    };
    new.validate()?;
    new.password_hash = services.hash_password(body.password).await?;

    let company = services.store.insert_company(new).await?;
    tracing::info!(handle = %company.handle, "company signed up");
    Ok(Json(company))
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> ApiResult<Json<Vec<Company>>> {
    require(&services, &token, Requirement::AnyOf(PrincipalKind::Company))?;
    let companies = services.store.list_companies().await?;
    Ok(Json(companies))
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(handle): Path<String>,
) -> ApiResult<Json<CompanyDetail>> {
    require(&services, &token, Requirement::AnyOf(PrincipalKind::Company))?;
    let handle = handle_from_path(&handle)?;

    let company = services
        .store
        .get_company(&handle)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no company: {handle}")))?;
    let jobs = services.store.list_jobs_for_company(&handle).await?;

    Ok(Json(CompanyDetail { company, jobs }))
}

pub async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(handle): Path<String>,
    body: Result<ApiJson<UpdateCompanyRequest>, ApiError>,
) -> ApiResult<Json<Company>> {
    require(&services, &token, Requirement::owner(PrincipalKind::Company, &handle))?;
    let handle = handle_from_path(&handle)?;
    let ApiJson(body) = body?;

    if body.handle.as_deref().is_some_and(|h| h != handle.as_str()) {
        return Err(ApiError::validation("handle cannot be changed"));
    }
    if let Some(password) = &body.password {
        validate_password(password)?;
    }
    let mut patch = CompanyPatch {
        name: body.name,
        logo: body.logo,
        email: body.email,
        password_hash: None,
    };
    if patch.is_empty() && body.password.is_none() {
        return Err(ApiError::validation("no fields to update"));
    }
    patch.validate()?;
    if let Some(password) = body.password {
        patch.password_hash = Some(services.hash_password(password).await?);
    }

    let company = services
        .store
        .update_company(&handle, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no company: {handle}")))?;
    Ok(Json(company))
}

pub async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(handle): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&services, &token, Requirement::owner(PrincipalKind::Company, &handle))?;
    let handle = handle_from_path(&handle)?;

    if !services.store.delete_company(&handle).await? {
        return Err(ApiError::not_found(format!("no company: {handle}")));
    }
    tracing::info!(handle = %handle, "company deleted");
    Ok(Json(MessageResponse::new("Deleted company!")))
}
