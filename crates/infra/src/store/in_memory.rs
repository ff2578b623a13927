use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use jobly_core::{
    Application, Company, CompanyPatch, Entity, Handle, Job, JobId, JobPatch, NewCompany, NewJob,
    NewUser, User, UserPatch, Username,
};

use super::{
    ApplicationStore, CompanyStore, Datastore, JobStore, StoreError, StoreResult, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    companies: BTreeMap<Handle, Company>,
    users: BTreeMap<Username, User>,
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<(Username, JobId), Application>,
    last_job_id: i64,
}

impl Tables {
    fn company_email_taken(&self, email: &str, except: Option<&Handle>) -> bool {
        self.companies
            .values()
            .any(|c| c.email == email && Some(&c.handle) != except)
    }

    fn user_email_taken(&self, email: &str, except: Option<&Username>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(&u.username) != except)
    }

    fn ensure_company(&self, handle: &Handle) -> StoreResult<()> {
        if self.companies.contains_key(handle) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(format!("company '{handle}'")))
        }
    }

    fn drop_applications_where(&mut self, pred: impl Fn(&Username, JobId) -> bool) {
        self.applications.retain(|(username, job_id), _| !pred(username, *job_id));
    }
}

fn insert_unique<E: Entity>(table: &mut BTreeMap<E::Id, E>, row: E, what: &str) -> StoreResult<()>
where
    E::Id: core::fmt::Display,
{
    let id = row.id().clone();
    if table.contains_key(&id) {
        return Err(StoreError::Conflict(format!("{what} '{id}' already exists")));
    }
    table.insert(id, row);
    Ok(())
}

/// In-memory datastore.
///
/// Intended for tests/dev. Emulates the SQL schema's unique, foreign-key,
/// cascade and set-null rules so handlers behave identically on either
/// backend. Each operation holds the lock for its whole duration, which makes
/// every operation atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl CompanyStore for InMemoryStore {
    async fn insert_company(&self, company: NewCompany) -> StoreResult<Company> {
        let company = company.into_company();
        let mut t = self.write()?;
        if t.company_email_taken(&company.email, None) {
            return Err(StoreError::Conflict(format!("email '{}' already in use", company.email)));
        }
        insert_unique(&mut t.companies, company.clone(), "company")?;
        Ok(company)
    }

    async fn get_company(&self, handle: &Handle) -> StoreResult<Option<Company>> {
        Ok(self.read()?.companies.get(handle).cloned())
    }

    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        Ok(self.read()?.companies.values().cloned().collect())
    }

    async fn update_company(&self, handle: &Handle, patch: CompanyPatch) -> StoreResult<Option<Company>> {
        let mut t = self.write()?;
        if let Some(email) = &patch.email {
            if t.company_email_taken(email.trim(), Some(handle)) {
                return Err(StoreError::Conflict(format!("email '{}' already in use", email.trim())));
            }
        }
        let Some(company) = t.companies.get_mut(handle) else {
            return Ok(None);
        };
        patch.apply_to(company);
        Ok(Some(company.clone()))
    }

    async fn delete_company(&self, handle: &Handle) -> StoreResult<bool> {
        let mut t = self.write()?;
        if t.companies.remove(handle).is_none() {
            return Ok(false);
        }

        let doomed: Vec<JobId> = t
            .jobs
            .values()
            .filter(|j| &j.company == handle)
            .map(|j| j.id)
            .collect();
        t.jobs.retain(|_, j| &j.company != handle);
        t.drop_applications_where(|_, job_id| doomed.contains(&job_id));

        for user in t.users.values_mut() {
            if user.current_company.as_ref() == Some(handle) {
                user.current_company = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = user.into_user();
        let mut t = self.write()?;
        if let Some(company) = &user.current_company {
            t.ensure_company(company)?;
        }
        if t.user_email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!("email '{}' already in use", user.email)));
        }
        insert_unique(&mut t.users, user.clone(), "user")?;
        Ok(user)
    }

    async fn get_user(&self, username: &Username) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn update_user(&self, username: &Username, patch: UserPatch) -> StoreResult<Option<User>> {
        let mut t = self.write()?;
        if !t.users.contains_key(username) {
            return Ok(None);
        }
        if let Some(Some(company)) = &patch.current_company {
            t.ensure_company(company)?;
        }
        if let Some(email) = &patch.email {
            if t.user_email_taken(email.trim(), Some(username)) {
                return Err(StoreError::Conflict(format!("email '{}' already in use", email.trim())));
            }
        }
        let Some(user) = t.users.get_mut(username) else {
            return Ok(None);
        };
        patch.apply_to(user);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, username: &Username) -> StoreResult<bool> {
        let mut t = self.write()?;
        if t.users.remove(username).is_none() {
            return Ok(false);
        }
        t.drop_applications_where(|u, _| u == username);
        Ok(true)
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn insert_job(&self, job: NewJob) -> StoreResult<Job> {
        let mut t = self.write()?;
        t.ensure_company(&job.company)?;
        t.last_job_id += 1;
        let job = job.into_job(JobId::new(t.last_job_id));
        insert_unique(&mut t.jobs, job.clone(), "job")?;
        Ok(job)
    }

    async fn get_job(&self, id: JobId) -> StoreResult<Option<Job>> {
        Ok(self.read()?.jobs.get(&id).cloned())
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(self.read()?.jobs.values().cloned().collect())
    }

    async fn list_jobs_for_company(&self, handle: &Handle) -> StoreResult<Vec<Job>> {
        Ok(self
            .read()?
            .jobs
            .values()
            .filter(|j| &j.company == handle)
            .cloned()
            .collect())
    }

    async fn update_job(&self, id: JobId, patch: JobPatch) -> StoreResult<Option<Job>> {
        let mut t = self.write()?;
        let Some(job) = t.jobs.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(job);
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, id: JobId) -> StoreResult<bool> {
        let mut t = self.write()?;
        if t.jobs.remove(&id).is_none() {
            return Ok(false);
        }
        t.drop_applications_where(|_, job_id| job_id == id);
        Ok(true)
    }
}

#[async_trait]
impl ApplicationStore for InMemoryStore {
    async fn apply(&self, username: &Username, job_id: JobId) -> StoreResult<Application> {
        let mut t = self.write()?;
        if !t.users.contains_key(username) {
            return Err(StoreError::MissingReference(format!("user '{username}'")));
        }
        if !t.jobs.contains_key(&job_id) {
            return Err(StoreError::MissingReference(format!("job {job_id}")));
        }
        let key = (username.clone(), job_id);
        if t.applications.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "'{username}' already applied to job {job_id}"
            )));
        }
        let application = Application {
            username: username.clone(),
            job_id,
            applied_at: Utc::now(),
        };
        t.applications.insert(key, application.clone());
        Ok(application)
    }

    async fn withdraw(&self, username: &Username, job_id: JobId) -> StoreResult<bool> {
        let mut t = self.write()?;
        Ok(t.applications.remove(&(username.clone(), job_id)).is_some())
    }

    async fn list_applications_for_job(&self, job_id: JobId) -> StoreResult<Vec<Application>> {
        Ok(self
            .read()?
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn list_applications_for_user(&self, username: &Username) -> StoreResult<Vec<Application>> {
        Ok(self
            .read()?
            .applications
            .values()
            .filter(|a| &a.username == username)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Datastore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(s: &str) -> Handle {
        Handle::parse(s).unwrap()
    }

    fn username(s: &str) -> Username {
        Username::parse(s).unwrap()
    }

    fn new_company(h: &str, email: &str) -> NewCompany {
        NewCompany {
            handle: handle(h),
            name: h.to_uppercase(),
            logo: None,
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_user(u: &str, email: &str, company: Option<&str>) -> NewUser {
        NewUser {
            username: username(u),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            email: email.to_string(),
            photo: None,
            current_company: company.map(handle),
            password_hash: "hash".to_string(),
        }
    }

    fn new_job(company: &str) -> NewJob {
        NewJob {
            title: "Engineer".to_string(),
            salary: 100_000,
            equity: 0.05,
            company: handle(company),
        }
    }

    #[tokio::test]
    async fn duplicate_handle_or_email_conflicts() {
        let store = InMemoryStore::new();
        store.insert_company(new_company("rithm", "a@rithm.com")).await.unwrap();

        let dup_handle = store.insert_company(new_company("rithm", "b@rithm.com")).await;
        assert!(matches!(dup_handle, Err(StoreError::Conflict(_))));

        let dup_email = store.insert_company(new_company("other", "a@rithm.com")).await;
        assert!(matches!(dup_email, Err(StoreError::Conflict(_))));

        // Nothing was overwritten.
        let stored = store.get_company(&handle("rithm")).await.unwrap().unwrap();
        assert_eq!(stored.email, "a@rithm.com");
        assert_eq!(store.list_companies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = InMemoryStore::new();
        store.insert_user(new_user("kevin", "k@x.com", None)).await.unwrap();

        assert!(matches!(
            store.insert_user(new_user("kevin", "other@x.com", None)).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.insert_user(new_user("kev2", "k@x.com", None)).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn updating_email_to_a_taken_one_conflicts() {
        let store = InMemoryStore::new();
        store.insert_user(new_user("a", "a@x.com", None)).await.unwrap();
        store.insert_user(new_user("b", "b@x.com", None)).await.unwrap();

        let res = store
            .update_user(
                &username("b"),
                UserPatch {
                    email: Some("a@x.com".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(res, Err(StoreError::Conflict(_))));

        // Re-saving your own email is fine.
        let res = store
            .update_user(
                &username("b"),
                UserPatch {
                    email: Some("b@x.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(res.is_some());
    }

    #[tokio::test]
    async fn missing_rows_report_none_or_false() {
        let store = InMemoryStore::new();
        assert!(store.get_user(&username("ghost")).await.unwrap().is_none());
        assert!(store
            .update_company(&handle("ghost"), CompanyPatch::default())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_user(&username("ghost")).await.unwrap());
        assert!(!store.delete_job(JobId::new(99)).await.unwrap());
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.insert_job(new_job("nobody")).await,
            Err(StoreError::MissingReference(_))
        ));
        assert!(matches!(
            store.insert_user(new_user("kevin", "k@x.com", Some("nobody"))).await,
            Err(StoreError::MissingReference(_))
        ));

        store.insert_user(new_user("kevin", "k@x.com", None)).await.unwrap();
        assert!(matches!(
            store.apply(&username("kevin"), JobId::new(1)).await,
            Err(StoreError::MissingReference(_))
        ));
    }

    #[tokio::test]
    async fn deleting_company_cascades_jobs_and_applications() {
        let store = InMemoryStore::new();
        store.insert_company(new_company("rithm", "r@x.com")).await.unwrap();
        store.insert_company(new_company("apple", "a@x.com")).await.unwrap();
        store
            .insert_user(new_user("kevin", "k@x.com", Some("rithm")))
            .await
            .unwrap();

        let doomed = store.insert_job(new_job("rithm")).await.unwrap();
        let kept = store.insert_job(new_job("apple")).await.unwrap();
        store.apply(&username("kevin"), doomed.id).await.unwrap();
        store.apply(&username("kevin"), kept.id).await.unwrap();

        assert!(store.delete_company(&handle("rithm")).await.unwrap());

        assert!(store.get_job(doomed.id).await.unwrap().is_none());
        assert_eq!(store.list_jobs().await.unwrap(), vec![kept.clone()]);
        assert!(store.list_applications_for_job(doomed.id).await.unwrap().is_empty());

        let remaining = store.list_applications_for_user(&username("kevin")).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].job_id, kept.id);

        let kevin = store.get_user(&username("kevin")).await.unwrap().unwrap();
        assert_eq!(kevin.current_company, None);
    }

    #[tokio::test]
    async fn current_company_can_be_changed_and_cleared() {
        let store = InMemoryStore::new();
        store.insert_company(new_company("rithm", "r@x.com")).await.unwrap();
        store.insert_user(new_user("kevin", "k@x.com", None)).await.unwrap();

        let unknown = UserPatch {
            current_company: Some(Some(handle("nope"))),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(&username("kevin"), unknown).await,
            Err(StoreError::MissingReference(_))
        ));

        let join = UserPatch {
            current_company: Some(Some(handle("rithm"))),
            ..Default::default()
        };
        let kevin = store.update_user(&username("kevin"), join).await.unwrap().unwrap();
        assert_eq!(kevin.current_company, Some(handle("rithm")));

        let leave = UserPatch {
            current_company: Some(None),
            ..Default::default()
        };
        let kevin = store.update_user(&username("kevin"), leave).await.unwrap().unwrap();
        assert_eq!(kevin.current_company, None);
    }

    #[tokio::test]
    async fn deleting_user_or_job_cascades_applications() {
        let store = InMemoryStore::new();
        store.insert_company(new_company("rithm", "r@x.com")).await.unwrap();
        store.insert_user(new_user("kevin", "k@x.com", None)).await.unwrap();
        store.insert_user(new_user("hueter", "h@x.com", None)).await.unwrap();
        let job = store.insert_job(new_job("rithm")).await.unwrap();

        store.apply(&username("kevin"), job.id).await.unwrap();
        store.apply(&username("hueter"), job.id).await.unwrap();

        assert!(store.delete_user(&username("kevin")).await.unwrap());
        let left = store.list_applications_for_job(job.id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].username, "hueter");

        assert!(store.delete_job(job.id).await.unwrap());
        assert!(store
            .list_applications_for_user(&username("hueter"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn applying_twice_conflicts_and_withdraw_is_idempotent() {
        let store = InMemoryStore::new();
        store.insert_company(new_company("rithm", "r@x.com")).await.unwrap();
        store.insert_user(new_user("kevin", "k@x.com", None)).await.unwrap();
        let job = store.insert_job(new_job("rithm")).await.unwrap();

        store.apply(&username("kevin"), job.id).await.unwrap();
        assert!(matches!(
            store.apply(&username("kevin"), job.id).await,
            Err(StoreError::Conflict(_))
        ));

        assert!(store.withdraw(&username("kevin"), job.id).await.unwrap());
        assert!(!store.withdraw(&username("kevin"), job.id).await.unwrap());
    }

    #[tokio::test]
    async fn job_ids_are_never_reused() {
        let store = InMemoryStore::new();
        store.insert_company(new_company("rithm", "r@x.com")).await.unwrap();
        let first = store.insert_job(new_job("rithm")).await.unwrap();
        store.delete_job(first.id).await.unwrap();
        let second = store.insert_job(new_job("rithm")).await.unwrap();
        assert!(second.id > first.id);
    }
}
