//! Job postings and applications to them.
//!
//! Reads are open to any verified principal. Writes on a job require the
//! owning company's token, checked after the job is loaded (unknown ids are
//! `404` for any company).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};

use jobly_auth::{authorize, PrincipalKind, Requirement};
use jobly_core::{Application, Job, JobId, JobPatch, NewJob};

use crate::app::dto::{CreateJobRequest, MessageResponse, UpdateJobRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{job_id_from_path, ApiJson};
use crate::app::services::AppServices;
use crate::authz::{require, require_company, require_user};
use crate::context::BearerToken;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_job).get(list_jobs))
        .route("/:id", get(get_job).patch(update_job).delete(delete_job))
        .route("/:id/apply", post(apply).delete(withdraw))
        .route("/:id/applications", get(list_applications))
}

async fn load_job(services: &AppServices, id: JobId) -> ApiResult<Job> {
    services
        .store
        .get_job(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no job: {id}")))
}

/// Load the job and confirm the caller's company owns it.
async fn load_owned_job(services: &AppServices, token: &BearerToken, raw_id: &str) -> ApiResult<Job> {
    let caller = require(services, token, Requirement::AnyOf(PrincipalKind::Company))?;
    let job = load_job(services, job_id_from_path(raw_id)?).await?;
    authorize(&caller, &Requirement::owner(PrincipalKind::Company, job.company.as_str()))?;
    Ok(job)
}

pub async fn create_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    body: Result<ApiJson<CreateJobRequest>, ApiError>,
) -> ApiResult<Json<Job>> {
    let company = require_company(&services, &token)?;
    let ApiJson(body) = body?;

    let new = NewJob {
        title: body.title,
        salary: body.salary,
        equity: body.equity,
        company,
    };
    new.validate()?;

    let job = services.store.insert_job(new).await?;
    tracing::info!(job_id = %job.id, company = %job.company, "job posted");
    Ok(Json(job))
}

pub async fn list_jobs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> ApiResult<Json<Vec<Job>>> {
    require(&services, &token, Requirement::Authenticated)?;
    let jobs = services.store.list_jobs().await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    require(&services, &token, Requirement::Authenticated)?;
    let job = load_job(&services, job_id_from_path(&id)?).await?;
    Ok(Json(job))
}

pub async fn update_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
    body: Result<ApiJson<UpdateJobRequest>, ApiError>,
) -> ApiResult<Json<Job>> {
    let job = load_owned_job(&services, &token, &id).await?;
    let ApiJson(body) = body?;

    let patch = JobPatch {
        title: body.title,
        salary: body.salary,
        equity: body.equity,
    };
    if patch.is_empty() {
        return Err(ApiError::validation("no fields to update"));
    }
    patch.validate()?;

    let job = services
        .store
        .update_job(job.id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no job: {}", job.id)))?;
    Ok(Json(job))
}

pub async fn delete_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let job = load_owned_job(&services, &token, &id).await?;

    if !services.store.delete_job(job.id).await? {
        return Err(ApiError::not_found(format!("no job: {}", job.id)));
    }
    tracing::info!(job_id = %job.id, company = %job.company, "job deleted");
    Ok(Json(MessageResponse::new("Deleted job!")))
}

pub async fn apply(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> ApiResult<Json<Application>> {
    let username = require_user(&services, &token)?;
    let job = load_job(&services, job_id_from_path(&id)?).await?;

    let application = services.store.apply(&username, job.id).await?;
    tracing::info!(username = %username, job_id = %job.id, "application submitted");
    Ok(Json(application))
}

pub async fn withdraw(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let username = require_user(&services, &token)?;
    let job_id = job_id_from_path(&id)?;

    if !services.store.withdraw(&username, job_id).await? {
        return Err(ApiError::not_found(format!(
            "no application from {username} to job {job_id}"
        )));
    }
    Ok(Json(MessageResponse::new("Withdrew application!")))
}

pub async fn list_applications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Application>>> {
    let job = load_owned_job(&services, &token, &id).await?;
    let applications = services.store.list_applications_for_job(job.id).await?;
    Ok(Json(applications))
}
