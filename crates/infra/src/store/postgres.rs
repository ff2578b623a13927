//! Postgres-backed datastore.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | duplicate handle, username, email or application |
//! | Database (foreign key violation) | `23503` | `MissingReference` | unknown company, user or job |
//! | Database (other) | Any other | `Backend` | check constraints, syntax, permissions |
//! | Other | N/A | `Backend` | pool closed, network, decode failures |
//!
//! Cascades live in the schema (see [`super::schema`]), so deletes are a
//! single statement each.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use jobly_core::{
    Application, Company, CompanyPatch, Handle, Job, JobId, JobPatch, NewCompany, NewJob, NewUser,
    User, UserPatch, Username,
};

use super::{
    schema, ApplicationStore, CompanyStore, Datastore, JobStore, StoreError, StoreResult, UserStore,
};

const COMPANY_COLUMNS: &str = "handle, name, logo, email, password";
const USER_COLUMNS: &str =
    "username, first_name, last_name, email, photo, current_company, password";
const JOB_COLUMNS: &str = "id, title, salary, equity, company";
const APPLICATION_COLUMNS: &str = "username, job_id, applied_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        schema::migrate(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn decode_err(e: jobly_core::DomainError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

struct CompanyRow(Company);

impl<'r> sqlx::FromRow<'r, PgRow> for CompanyRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CompanyRow(Company {
            handle: Handle::parse(row.try_get::<String, _>("handle")?).map_err(decode_err)?,
            name: row.try_get("name")?,
            logo: row.try_get("logo")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
        }))
    }
}

struct UserRow(User);

impl<'r> sqlx::FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let current_company = row
            .try_get::<Option<String>, _>("current_company")?
            .map(Handle::parse)
            .transpose()
            .map_err(decode_err)?;
        Ok(UserRow(User {
            username: Username::parse(row.try_get::<String, _>("username")?).map_err(decode_err)?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            photo: row.try_get("photo")?,
            current_company,
            password_hash: row.try_get("password")?,
        }))
    }
}

struct JobRow(Job);

impl<'r> sqlx::FromRow<'r, PgRow> for JobRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(JobRow(Job {
            id: JobId::new(row.try_get("id")?),
            title: row.try_get("title")?,
            salary: row.try_get("salary")?,
            equity: row.try_get("equity")?,
            company: Handle::parse(row.try_get::<String, _>("company")?).map_err(decode_err)?,
        }))
    }
}

struct ApplicationRow(Application);

impl<'r> sqlx::FromRow<'r, PgRow> for ApplicationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ApplicationRow(Application {
            username: Username::parse(row.try_get::<String, _>("username")?).map_err(decode_err)?,
            job_id: JobId::new(row.try_get("job_id")?),
            applied_at: row.try_get::<DateTime<Utc>, _>("applied_at")?,
        }))
    }
}

#[async_trait]
impl CompanyStore for PostgresStore {
    #[instrument(skip(self, company), fields(handle = %company.handle), err)]
    async fn insert_company(&self, company: NewCompany) -> StoreResult<Company> {
        let company = company.into_company();
        let sql = format!(
            "INSERT INTO companies ({COMPANY_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {COMPANY_COLUMNS}"
        );
        let row: CompanyRow = sqlx::query_as(&sql)
            .bind(company.handle.as_str())
            .bind(&company.name)
            .bind(&company.logo)
            .bind(&company.email)
            .bind(&company.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_company", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self), fields(handle = %handle), err)]
    async fn get_company(&self, handle: &Handle) -> StoreResult<Option<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE handle = $1");
        let row: Option<CompanyRow> = sqlx::query_as(&sql)
            .bind(handle.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_company", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), err)]
    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY handle COLLATE \"C\"");
        let rows: Vec<CompanyRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_companies", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self, patch), fields(handle = %handle), err)]
    async fn update_company(&self, handle: &Handle, patch: CompanyPatch) -> StoreResult<Option<Company>> {
        let sql = format!(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                logo = COALESCE($3, logo),
                email = COALESCE($4, email),
                password = COALESCE($5, password)
            WHERE handle = $1
            RETURNING {COMPANY_COLUMNS}
            "#
        );
        let row: Option<CompanyRow> = sqlx::query_as(&sql)
            .bind(handle.as_str())
            .bind(trimmed(patch.name))
            .bind(patch.logo)
            .bind(trimmed(patch.email))
            .bind(patch.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_company", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), fields(handle = %handle), err)]
    async fn delete_company(&self, handle: &Handle) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM companies WHERE handle = $1")
            .bind(handle.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_company", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = user.into_user();
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(user.username.as_str())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.photo)
            .bind(user.current_company.as_ref().map(Handle::as_str))
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self), fields(username = %username), err)]
    async fn get_user(&self, username: &Username) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username COLLATE \"C\"");
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self, patch), fields(username = %username), err)]
    async fn update_user(&self, username: &Username, patch: UserPatch) -> StoreResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                photo = COALESCE($5, photo),
                current_company = CASE WHEN $8 THEN $6 ELSE current_company END,
                password = COALESCE($7, password)
            WHERE username = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(username.as_str())
            .bind(trimmed(patch.first_name))
            .bind(trimmed(patch.last_name))
            .bind(trimmed(patch.email))
            .bind(patch.photo)
            .bind(patch.current_company.clone().flatten().map(String::from))
            .bind(patch.password_hash)
            .bind(patch.current_company.is_some())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), fields(username = %username), err)]
    async fn delete_user(&self, username: &Username) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JobStore for PostgresStore {
    #[instrument(skip(self, job), fields(company = %job.company), err)]
    async fn insert_job(&self, job: NewJob) -> StoreResult<Job> {
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company) VALUES ($1, $2, $3, $4) RETURNING {JOB_COLUMNS}"
        );
        let row: JobRow = sqlx::query_as(&sql)
            .bind(job.title.trim())
            .bind(job.salary)
            .bind(job.equity)
            .bind(job.company.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_job", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self), fields(job_id = %id), err)]
    async fn get_job(&self, id: JobId) -> StoreResult<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let row: Option<JobRow> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_job", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), err)]
    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY id");
        let rows: Vec<JobRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_jobs", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), fields(company = %handle), err)]
    async fn list_jobs_for_company(&self, handle: &Handle) -> StoreResult<Vec<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE company = $1 ORDER BY id");
        let rows: Vec<JobRow> = sqlx::query_as(&sql)
            .bind(handle.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_jobs_for_company", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self, patch), fields(job_id = %id), err)]
    async fn update_job(&self, id: JobId, patch: JobPatch) -> StoreResult<Option<Job>> {
        let sql = format!(
            r#"
            UPDATE jobs SET
                title = COALESCE($2, title),
                salary = COALESCE($3, salary),
                equity = COALESCE($4, equity)
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row: Option<JobRow> = sqlx::query_as(&sql)
            .bind(id.get())
            .bind(trimmed(patch.title))
            .bind(patch.salary)
            .bind(patch.equity)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_job", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), fields(job_id = %id), err)]
    async fn delete_job(&self, id: JobId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_job", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ApplicationStore for PostgresStore {
    #[instrument(skip(self), fields(username = %username, job_id = %job_id), err)]
    async fn apply(&self, username: &Username, job_id: JobId) -> StoreResult<Application> {
        let sql = format!(
            "INSERT INTO applications (username, job_id) VALUES ($1, $2) RETURNING {APPLICATION_COLUMNS}"
        );
        let row: ApplicationRow = sqlx::query_as(&sql)
            .bind(username.as_str())
            .bind(job_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self), fields(username = %username, job_id = %job_id), err)]
    async fn withdraw(&self, username: &Username, job_id: JobId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE username = $1 AND job_id = $2")
            .bind(username.as_str())
            .bind(job_id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("withdraw", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(job_id = %job_id), err)]
    async fn list_applications_for_job(&self, job_id: JobId) -> StoreResult<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 ORDER BY username COLLATE \"C\""
        );
        let rows: Vec<ApplicationRow> = sqlx::query_as(&sql)
            .bind(job_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_applications_for_job", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), fields(username = %username), err)]
    async fn list_applications_for_user(&self, username: &Username) -> StoreResult<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE username = $1 ORDER BY job_id"
        );
        let rows: Vec<ApplicationRow> = sqlx::query_as(&sql)
            .bind(username.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_applications_for_user", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

#[async_trait]
impl Datastore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_map_to_backend() {
        assert!(matches!(
            map_sqlx_error("get_job", sqlx::Error::PoolClosed),
            StoreError::Backend(msg) if msg.contains("get_job")
        ));
        assert!(matches!(
            map_sqlx_error("get_job", sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn patches_are_trimmed_before_binding() {
        assert_eq!(trimmed(Some("  Rithm ".into())).as_deref(), Some("Rithm"));
        assert_eq!(trimmed(None), None);
    }
}
