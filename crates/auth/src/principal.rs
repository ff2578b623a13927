use serde::{Deserialize, Serialize};

use jobly_core::{Handle, Username};

/// The two kinds of actor that can authenticate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Company,
    User,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Company => "company",
            PrincipalKind::User => "user",
        }
    }
}

impl core::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated actor.
///
/// Serialized with a `kind` tag and the kind's own identity claim, e.g.
/// `{"kind":"company","handle":"rithm"}` or `{"kind":"user","username":"hueter"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    Company { handle: Handle },
    User { username: Username },
}

impl Principal {
    pub fn company(handle: Handle) -> Self {
        Self::Company { handle }
    }

    pub fn user(username: Username) -> Self {
        Self::User { username }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Company { .. } => PrincipalKind::Company,
            Principal::User { .. } => PrincipalKind::User,
        }
    }

    /// The principal's unique identity (handle or username).
    pub fn identity(&self) -> &str {
        match self {
            Principal::Company { handle } => handle.as_str(),
            Principal::User { username } => username.as_str(),
        }
    }

    pub fn as_company(&self) -> Option<&Handle> {
        match self {
            Principal::Company { handle } => Some(handle),
            Principal::User { .. } => None,
        }
    }

    pub fn as_user(&self) -> Option<&Username> {
        match self {
            Principal::User { username } => Some(username),
            Principal::Company { .. } => None,
        }
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_principal_serializes_handle_claim() {
        let p = Principal::company(Handle::parse("rithm").unwrap());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "company", "handle": "rithm" }));
    }

    #[test]
    fn user_principal_round_trips() {
        let json = serde_json::json!({ "kind": "user", "username": "hueter" });
        let p: Principal = serde_json::from_value(json).unwrap();
        assert_eq!(p.kind(), PrincipalKind::User);
        assert_eq!(p.identity(), "hueter");
        assert!(p.as_company().is_none());
    }

    #[test]
    fn mismatched_claim_for_kind_is_rejected() {
        let json = serde_json::json!({ "kind": "company", "username": "hueter" });
        assert!(serde_json::from_value::<Principal>(json).is_err());
    }
}
