//! Applications: the user/job join entity.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::id::{JobId, Username};

/// A user's application to a job. At most one per (user, job) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Application {
    pub username: Username,
    pub job_id: JobId,
    pub applied_at: DateTime<Utc>,
}
