use serde::{Deserialize, Deserializer, Serialize};

use jobly_core::{Company, Handle, Job, JobId, User, Username};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CompanySignupRequest {
    pub handle: Handle,
    pub name: String,
    pub logo: Option<String>,
    pub email: String,
    pub password: String,
}

/// Identity is taken as a plain string so malformed handles fail as bad
/// credentials rather than bad input.
#[derive(Debug, Deserialize)]
pub struct CompanyAuthRequest {
    pub handle: String,
    pub password: String,
}

/// `handle` is immutable: it may be echoed back but must match the path.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCompanyRequest {
    pub handle: Option<String>,
    pub name: Option<String>,
    pub logo: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserSignupRequest {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub photo: Option<String>,
    pub current_company: Option<Handle>,
}

#[derive(Debug, Deserialize)]
pub struct UserAuthRequest {
    pub username: String,
    pub password: String,
}

/// `username` may be echoed back but must match the path. An explicit
/// `"current_company": null` clears the affiliation.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub current_company: Option<Option<Handle>>,
    pub password: Option<String>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The owning company always comes from the caller's token.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    pub title: String,
    pub salary: i64,
    pub equity: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub salary: Option<i64>,
    pub equity: Option<f64>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Company plus the jobs it currently owns.
#[derive(Debug, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

/// User plus the ids of jobs they applied to.
#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub applications: Vec<JobId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_patch_accepts_echoed_handle() {
        let body = r#"{"name":"rithm","email":"google@gmail.com","handle":"rithm","password":"foo123","logo":null}"#;
        let patch: UpdateCompanyRequest = serde_json::from_str(body).unwrap();
        assert_eq!(patch.handle.as_deref(), Some("rithm"));
        assert_eq!(patch.name.as_deref(), Some("rithm"));
        assert!(serde_json::from_str::<UpdateCompanyRequest>(r#"{"id":1}"#).is_err());
    }

    #[test]
    fn user_patch_accepts_echoed_username() {
        let patch: UpdateUserRequest =
            serde_json::from_str(r#"{"username":"hueter","first_name":"Elie"}"#).unwrap();
        assert_eq!(patch.username.as_deref(), Some("hueter"));
        assert!(serde_json::from_str::<UpdateUserRequest>(r#"{"nickname":"x"}"#).is_err());
    }

    #[test]
    fn current_company_null_differs_from_absent() {
        let absent: UpdateUserRequest = serde_json::from_str(r#"{"first_name":"A"}"#).unwrap();
        assert_eq!(absent.current_company, None);

        let cleared: UpdateUserRequest = serde_json::from_str(r#"{"current_company":null}"#).unwrap();
        assert_eq!(cleared.current_company, Some(None));

        let set: UpdateUserRequest = serde_json::from_str(r#"{"current_company":"rithm"}"#).unwrap();
        assert_eq!(set.current_company, Some(Some(Handle::parse("rithm").unwrap())));
    }

    #[test]
    fn signup_validates_identity_on_parse() {
        let body = r#"{"username":"bad name","first_name":"A","last_name":"B","email":"a@b.c","password":"pw"}"#;
        assert!(serde_json::from_str::<UserSignupRequest>(body).is_err());
    }

    #[test]
    fn user_detail_flattens_record_and_hides_password() {
        let user = User {
            username: Username::parse("hueter").unwrap(),
            first_name: "Michael".into(),
            last_name: "Hueter".into(),
            email: "m@rithm.com".into(),
            photo: None,
            current_company: None,
            password_hash: "secret".into(),
        };
        let json = serde_json::to_value(UserDetail {
            user,
            applications: vec![JobId::new(3)],
        })
        .unwrap();
        assert_eq!(json["username"], "hueter");
        assert_eq!(json["applications"], serde_json::json!([3]));
        assert!(json.get("password_hash").is_none());
    }
}
