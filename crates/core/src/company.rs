//! Company records.

use serde::Serialize;

use crate::entity::Entity;
use crate::error::{require_email, require_text, DomainResult};
use crate::id::Handle;

/// A stored company row.
///
/// `password_hash` never leaves the process: it is skipped on serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    pub handle: Handle,
    pub name: String,
    pub logo: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl Entity for Company {
    type Id = Handle;

    fn id(&self) -> &Self::Id {
        &self.handle
    }
}

/// Insert payload for a company signup (password already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub handle: Handle,
    pub name: String,
    pub logo: Option<String>,
    pub email: String,
    pub password_hash: String,
}

impl NewCompany {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_email(&self.email)?;
        Ok(())
    }

    pub fn into_company(self) -> Company {
        Company {
            handle: self.handle,
            name: self.name.trim().to_string(),
            logo: self.logo,
            email: self.email.trim().to_string(),
            password_hash: self.password_hash,
        }
    }
}

/// Partial update of a company. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl CompanyPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.logo.is_none() && self.email.is_none() && self.password_hash.is_none()
    }

    /// Apply the patch in place.
    pub fn apply_to(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name.trim().to_string();
        }
        if let Some(logo) = self.logo {
            company.logo = Some(logo);
        }
        if let Some(email) = self.email {
            company.email = email.trim().to_string();
        }
        if let Some(hash) = self.password_hash {
            company.password_hash = hash;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rithm() -> NewCompany {
        NewCompany {
            handle: Handle::parse("rithm").unwrap(),
            name: " Rithm School ".to_string(),
            logo: None,
            email: "hello@rithmschool.com".to_string(),
            password_hash: "hashed".to_string(),
        }
    }

    #[test]
    fn serialized_company_hides_password() {
        let company = rithm().into_company();
        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["handle"], "rithm");
        assert_eq!(json["name"], "Rithm School");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn signup_requires_name_and_email() {
        let mut c = rithm();
        c.name = "  ".into();
        assert!(c.validate().is_err());

        let mut c = rithm();
        c.email = "nope".into();
        assert!(c.validate().is_err());

        assert!(rithm().validate().is_ok());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut company = rithm().into_company();
        CompanyPatch {
            logo: Some("https://rithm.example/logo.png".into()),
            ..Default::default()
        }
        .apply_to(&mut company);

        assert_eq!(company.name, "Rithm School");
        assert_eq!(company.logo.as_deref(), Some("https://rithm.example/logo.png"));
        assert_eq!(company.password_hash, "hashed");
    }
}
