//! Persistence boundary.
//!
//! Handlers talk to persistence only through these traits. Both
//! implementations enforce the same relational rules:
//!
//! | rule | effect |
//! |------|--------|
//! | unique `companies.handle`, `companies.email` | `StoreError::Conflict` |
//! | unique `users.username`, `users.email` | `StoreError::Conflict` |
//! | one application per (user, job) | `StoreError::Conflict` |
//! | `users.current_company` → company | `MissingReference` on write, set null on company delete |
//! | `jobs.company` → company | `MissingReference` on write, cascade on company delete |
//! | `applications` → user, job | `MissingReference` on write, cascade on either delete |

use async_trait::async_trait;
use thiserror::Error;

use jobly_core::{
    Application, Company, CompanyPatch, Handle, Job, JobId, JobPatch, NewCompany, NewJob, NewUser,
    User, UserPatch, Username,
};

pub mod in_memory;
pub mod postgres;
pub mod schema;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key (handle, username, email, application pair) already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced company, user or job does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// Connection, decoding or other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn insert_company(&self, company: NewCompany) -> StoreResult<Company>;

    async fn get_company(&self, handle: &Handle) -> StoreResult<Option<Company>>;

    /// All companies ordered by handle.
    async fn list_companies(&self) -> StoreResult<Vec<Company>>;

    /// `Ok(None)` when no company has `handle`.
    async fn update_company(&self, handle: &Handle, patch: CompanyPatch) -> StoreResult<Option<Company>>;

    /// Deletes the company, its jobs, and applications to those jobs; clears
    /// `current_company` on users that pointed at it. `Ok(false)` when absent.
    async fn delete_company(&self, handle: &Handle) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn get_user(&self, username: &Username) -> StoreResult<Option<User>>;

    /// All users ordered by username.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn update_user(&self, username: &Username, patch: UserPatch) -> StoreResult<Option<User>>;

    /// Deletes the user and their applications. `Ok(false)` when absent.
    async fn delete_user(&self, username: &Username) -> StoreResult<bool>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: NewJob) -> StoreResult<Job>;

    async fn get_job(&self, id: JobId) -> StoreResult<Option<Job>>;

    /// All jobs ordered by id.
    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;

    async fn list_jobs_for_company(&self, handle: &Handle) -> StoreResult<Vec<Job>>;

    async fn update_job(&self, id: JobId, patch: JobPatch) -> StoreResult<Option<Job>>;

    /// Deletes the job and its applications. `Ok(false)` when absent.
    async fn delete_job(&self, id: JobId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn apply(&self, username: &Username, job_id: JobId) -> StoreResult<Application>;

    /// `Ok(false)` when there was no such application.
    async fn withdraw(&self, username: &Username, job_id: JobId) -> StoreResult<bool>;

    async fn list_applications_for_job(&self, job_id: JobId) -> StoreResult<Vec<Application>>;

    async fn list_applications_for_user(&self, username: &Username) -> StoreResult<Vec<Application>>;
}

/// The full datastore handle passed explicitly to request handlers.
#[async_trait]
pub trait Datastore: CompanyStore + UserStore + JobStore + ApplicationStore {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Release pooled resources. Called once on shutdown.
    async fn close(&self) {}
}
