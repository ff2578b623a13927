use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Principal;

/// Token claims model (transport-agnostic).
///
/// The principal is flattened into the claim set, so a company token carries
/// `kind` + `handle` and a user token carries `kind` + `username` at the top
/// level of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(flatten)]
    pub principal: Principal,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    pub fn new(principal: Principal, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            principal,
            issued_at: now,
            expires_at: now + ttl,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate token claims.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::token`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobly_core::Handle;

    fn claims(now: DateTime<Utc>) -> TokenClaims {
        TokenClaims::new(
            Principal::company(Handle::parse("rithm").unwrap()),
            now,
            Duration::minutes(10),
        )
    }

    #[test]
    fn window_checks() {
        let now = Utc::now();
        let c = claims(now);
        assert_eq!(validate_claims(&c, now), Ok(()));
        assert_eq!(
            validate_claims(&c, now - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&c, now + Duration::minutes(10)),
            Err(TokenValidationError::Expired)
        );

        let mut inverted = c.clone();
        inverted.expires_at = inverted.issued_at;
        assert_eq!(
            validate_claims(&inverted, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn principal_is_flattened_into_payload() {
        let json = serde_json::to_value(claims(Utc::now())).unwrap();
        assert_eq!(json["kind"], "company");
        assert_eq!(json["handle"], "rithm");
        assert!(json.get("principal").is_none());

        let back: TokenClaims = serde_json::from_value(json).unwrap();
        assert_eq!(back.principal.identity(), "rithm");
    }
}
