use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use jobly_core::{Handle, JobId, Username};

use crate::app::errors::ApiError;

/// `Json<T>` whose rejections use the API error body instead of plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

// Path identities that fail to parse cannot name an existing record.

pub fn handle_from_path(raw: &str) -> Result<Handle, ApiError> {
    Handle::parse(raw).map_err(|_| ApiError::not_found(format!("no company: {raw}")))
}

pub fn username_from_path(raw: &str) -> Result<Username, ApiError> {
    Username::parse(raw).map_err(|_| ApiError::not_found(format!("no user: {raw}")))
}

pub fn job_id_from_path(raw: &str) -> Result<JobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("no job: {raw}")))
}
