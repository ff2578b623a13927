use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Principal, PrincipalKind, TokenService};

/// What a route demands of its caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Requirement<'a> {
    /// Any verified principal, company or user.
    Authenticated,

    /// Any verified principal of the given kind (list/read endpoints).
    AnyOf(PrincipalKind),

    /// Only the principal of `kind` whose identity equals `identity`
    /// (self-only writes).
    Owner { kind: PrincipalKind, identity: &'a str },
}

impl<'a> Requirement<'a> {
    pub fn owner(kind: PrincipalKind, identity: &'a str) -> Self {
        Self::Owner { kind, identity }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No token, or a token that failed verification.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Verified, but not allowed to touch this resource.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Decide whether a verified principal satisfies a requirement.
///
/// - No IO
/// - No panics
/// - Kind is checked before identity, so a user can never own a company route
///   even when a username happens to equal a handle.
pub fn authorize(principal: &Principal, required: &Requirement<'_>) -> Result<(), AuthzError> {
    match *required {
        Requirement::Authenticated => Ok(()),
        Requirement::AnyOf(kind) => {
            if principal.kind() == kind {
                Ok(())
            } else {
                Err(AuthzError::Forbidden(format!(
                    "requires a {kind} token, got a {} token",
                    principal.kind()
                )))
            }
        }
        Requirement::Owner { kind, identity } => {
            if principal.kind() != kind {
                return Err(AuthzError::Forbidden(format!(
                    "requires a {kind} token, got a {} token",
                    principal.kind()
                )));
            }
            if principal.identity() != identity {
                return Err(AuthzError::Forbidden(format!(
                    "{principal} may not modify {kind} '{identity}'"
                )));
            }
            Ok(())
        }
    }
}

/// Request gate: verifies the bearer token and applies [`authorize`].
///
/// Stateless per request; the only collaborator is the token verifier.
#[derive(Clone)]
pub struct Guard {
    tokens: Arc<dyn TokenService>,
}

impl Guard {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }

    /// Resolve the calling principal and check it against `required`.
    pub fn check(
        &self,
        token: Option<&str>,
        required: &Requirement<'_>,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthzError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthzError::Unauthenticated("missing token".to_string()))?;

        let claims = self.tokens.verify(token, now).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthzError::Unauthenticated(e.to_string())
        })?;

        if let Err(e) = authorize(&claims.principal, required) {
            tracing::debug!(principal = %claims.principal, error = %e, "authorization denied");
            return Err(e);
        }

        Ok(claims.principal)
    }
}

impl core::fmt::Debug for Guard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
