//! User records.

use serde::Serialize;

use crate::entity::Entity;
use crate::error::{require_email, require_text, DomainResult};
use crate::id::{Handle, Username};

/// A stored user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo: Option<String>,
    /// Set to `None` when the referenced company is deleted.
    pub current_company: Option<Handle>,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl Entity for User {
    type Id = Username;

    fn id(&self) -> &Self::Id {
        &self.username
    }
}

/// Insert payload for a user signup (password already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo: Option<String>,
    pub current_company: Option<Handle>,
    pub password_hash: String,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        require_email(&self.email)?;
        Ok(())
    }

    pub fn into_user(self) -> User {
        User {
            username: self.username,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            photo: self.photo,
            current_company: self.current_company,
            password_hash: self.password_hash,
        }
    }
}

/// Partial update of a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    /// `Some(None)` clears the affiliation.
    pub current_company: Option<Option<Handle>>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(first) = &self.first_name {
            require_text("first_name", first)?;
        }
        if let Some(last) = &self.last_name {
            require_text("last_name", last)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.photo.is_none()
            && self.current_company.is_none()
            && self.password_hash.is_none()
    }

    pub fn apply_to(self, user: &mut User) {
        if let Some(first) = self.first_name {
            user.first_name = first.trim().to_string();
        }
        if let Some(last) = self.last_name {
            user.last_name = last.trim().to_string();
        }
        if let Some(email) = self.email {
            user.email = email.trim().to_string();
        }
        if let Some(photo) = self.photo {
            user.photo = Some(photo);
        }
        if let Some(company) = self.current_company {
            user.current_company = company;
        }
        if let Some(hash) = self.password_hash {
            user.password_hash = hash;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hueter() -> NewUser {
        NewUser {
            username: Username::parse("hueter").unwrap(),
            first_name: "Michael".into(),
            last_name: "Hueter".into(),
            email: "michael@rithmschool.com".into(),
            photo: None,
            current_company: None,
            password_hash: "hashed".into(),
        }
    }

    #[test]
    fn signup_requires_names() {
        let mut u = hueter();
        u.last_name.clear();
        assert!(u.validate().is_err());
        assert!(hueter().validate().is_ok());
    }

    #[test]
    fn serialized_user_hides_password() {
        let json = serde_json::to_value(hueter().into_user()).unwrap();
        assert_eq!(json["username"], "hueter");
        assert_eq!(json["current_company"], serde_json::Value::Null);
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn patch_rehashes_only_when_given() {
        let mut user = hueter().into_user();
        UserPatch {
            first_name: Some("Mike".into()),
            ..Default::default()
        }
        .apply_to(&mut user);
        assert_eq!(user.first_name, "Mike");
        assert_eq!(user.password_hash, "hashed");

        UserPatch {
            password_hash: Some("rehashed".into()),
            ..Default::default()
        }
        .apply_to(&mut user);
        assert_eq!(user.password_hash, "rehashed");
    }

    #[test]
    fn patch_can_set_and_clear_current_company() {
        let mut user = hueter().into_user();
        let rithm = Handle::parse("rithm").unwrap();

        let set = UserPatch {
            current_company: Some(Some(rithm.clone())),
            ..Default::default()
        };
        assert!(!set.is_empty());
        set.apply_to(&mut user);
        assert_eq!(user.current_company, Some(rithm.clone()));

        UserPatch::default().apply_to(&mut user);
        assert_eq!(user.current_company, Some(rithm));

        let clear = UserPatch {
            current_company: Some(None),
            ..Default::default()
        };
        assert!(!clear.is_empty());
        clear.apply_to(&mut user);
        assert_eq!(user.current_company, None);
    }
}
