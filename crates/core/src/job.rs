//! Job postings.

use serde::Serialize;

use crate::entity::Entity;
use crate::error::{require_text, DomainError, DomainResult};
use crate::id::{Handle, JobId};

/// A stored job row, owned by exactly one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub salary: i64,
    /// Fraction of the company offered, within `0.0..=1.0`.
    pub equity: f64,
    pub company: Handle,
}

impl Entity for Job {
    type Id = JobId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn require_salary(salary: i64) -> DomainResult<()> {
    if salary < 0 {
        return Err(DomainError::validation("salary must be non-negative"));
    }
    Ok(())
}

fn require_equity(equity: f64) -> DomainResult<()> {
    if !(0.0..=1.0).contains(&equity) {
        return Err(DomainError::validation("equity must be between 0 and 1"));
    }
    Ok(())
}

/// Insert payload for a job; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub salary: i64,
    pub equity: f64,
    pub company: Handle,
}

impl NewJob {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("title", &self.title)?;
        require_salary(self.salary)?;
        require_equity(self.equity)?;
        Ok(())
    }

    pub fn into_job(self, id: JobId) -> Job {
        Job {
            id,
            title: self.title.trim().to_string(),
            salary: self.salary,
            equity: self.equity,
            company: self.company,
        }
    }
}

/// Partial update of a job. Ownership cannot be transferred.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub title: Option<String>,
    pub salary: Option<i64>,
    pub equity: Option<f64>,
}

impl JobPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(salary) = self.salary {
            require_salary(salary)?;
        }
        if let Some(equity) = self.equity {
            require_equity(equity)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.salary.is_none() && self.equity.is_none()
    }

    pub fn apply_to(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title.trim().to_string();
        }
        if let Some(salary) = self.salary {
            job.salary = salary;
        }
        if let Some(equity) = self.equity {
            job.equity = equity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engineer() -> NewJob {
        NewJob {
            title: "Software Engineer".into(),
            salary: 120_000,
            equity: 0.01,
            company: Handle::parse("rithm").unwrap(),
        }
    }

    #[test]
    fn equity_is_a_fraction() {
        let mut job = engineer();
        job.equity = 1.5;
        assert!(job.validate().is_err());
        job.equity = -0.1;
        assert!(job.validate().is_err());
        job.equity = f64::NAN;
        assert!(job.validate().is_err());
        assert!(engineer().validate().is_ok());
    }

    #[test]
    fn negative_salary_rejected() {
        let patch = JobPatch {
            salary: Some(-1),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_keeps_owner() {
        let mut job = engineer().into_job(JobId::new(1));
        JobPatch {
            title: Some("Staff Engineer".into()),
            ..Default::default()
        }
        .apply_to(&mut job);
        assert_eq!(job.title, "Staff Engineer");
        assert_eq!(job.company, "rithm");
    }
}
