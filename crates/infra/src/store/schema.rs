//! Relational schema for the Postgres backend.
//!
//! Applied idempotently at startup by [`migrate`]. Foreign keys carry the
//! cascade and set-null rules so deletes never leave dangling rows.

use sqlx::PgPool;
use tracing::instrument;

use super::StoreError;

pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        handle   TEXT PRIMARY KEY,
        name     TEXT NOT NULL,
        logo     TEXT,
        email    TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        username        TEXT PRIMARY KEY,
        password        TEXT NOT NULL,
        first_name      TEXT NOT NULL,
        last_name       TEXT NOT NULL,
        email           TEXT NOT NULL UNIQUE,
        photo           TEXT,
        current_company TEXT REFERENCES companies (handle) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id      BIGSERIAL PRIMARY KEY,
        title   TEXT NOT NULL,
        salary  BIGINT NOT NULL CHECK (salary >= 0),
        equity  DOUBLE PRECISION NOT NULL CHECK (equity >= 0 AND equity <= 1),
        company TEXT NOT NULL REFERENCES companies (handle) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS jobs_company_idx ON jobs (company)",
    r#"
    CREATE TABLE IF NOT EXISTS applications (
        username   TEXT NOT NULL REFERENCES users (username) ON DELETE CASCADE,
        job_id     BIGINT NOT NULL REFERENCES jobs (id) ON DELETE CASCADE,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (username, job_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS applications_job_idx ON applications (job_id)",
];

/// Create any missing tables and indexes.
#[instrument(skip(pool), err)]
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(*statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;
    }
    tracing::info!(statements = STATEMENTS.len(), "schema up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_idempotent() {
        for statement in STATEMENTS {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "non-idempotent statement: {statement}"
            );
        }
    }

    #[test]
    fn tables_are_created_before_they_are_referenced() {
        let position = |needle: &str| {
            STATEMENTS
                .iter()
                .position(|s| s.contains(needle))
                .unwrap()
        };
        assert!(position("TABLE IF NOT EXISTS companies") < position("TABLE IF NOT EXISTS users"));
        assert!(position("TABLE IF NOT EXISTS companies") < position("TABLE IF NOT EXISTS jobs"));
        assert!(position("TABLE IF NOT EXISTS jobs") < position("TABLE IF NOT EXISTS applications"));
    }
}
