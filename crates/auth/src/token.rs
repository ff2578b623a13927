//! Signed identity tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{validate_claims, TokenClaims, TokenValidationError};
use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed token, bad signature, or claims that do not decode.
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("invalid token: {0}")]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Token issuer/verifier capability.
///
/// Verification must be stateless: no session table, no revocation list. The
/// same token verified at the same instant always yields the same claims.
pub trait TokenService: Send + Sync {
    fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, TokenError>;

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError>;
}

/// HMAC-SHA256 JWT signer.
///
/// Expiry is carried in the claim set (`issued_at` / `expires_at`) and checked
/// by [`validate_claims`], so the registered `exp` claim is not required.
pub struct Hs256TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl core::fmt::Debug for Hs256TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService for Hs256TokenService {
    fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims::new(principal.clone(), now, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobly_core::{Handle, Username};
    use proptest::prelude::*;

    fn service() -> Hs256TokenService {
        Hs256TokenService::new(b"test-secret", Duration::hours(1))
    }

    #[test]
    fn company_token_decodes_to_handle() {
        let svc = service();
        let now = Utc::now();
        let principal = Principal::company(Handle::parse("rithm").unwrap());

        let token = svc.issue(&principal, now).unwrap();
        let claims = svc.verify(&token, now).unwrap();

        assert_eq!(claims.principal, principal);
        assert_eq!(claims.principal.identity(), "rithm");
    }

    #[test]
    fn verification_is_repeatable() {
        let svc = service();
        let now = Utc::now();
        let token = svc
            .issue(&Principal::user(Username::parse("hueter").unwrap()), now)
            .unwrap();

        let first = svc.verify(&token, now).unwrap();
        let second = svc.verify(&token, now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let now = Utc::now();
        let other = Hs256TokenService::new(b"other-secret", Duration::hours(1));
        let token = other
            .issue(&Principal::user(Username::parse("kevin").unwrap()), now)
            .unwrap();

        assert!(matches!(service().verify(&token, now), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn garbage_and_tampered_tokens_are_rejected() {
        let svc = service();
        let now = Utc::now();
        assert!(svc.verify("not-a-token", now).is_err());
        assert!(svc.verify("", now).is_err());

        // Keep the genuine header and signature, swap in a payload naming someone else.
        let forged = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &TokenClaims::new(Principal::user(Username::parse("admin").unwrap()), now, Duration::hours(1)),
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();

        let token = svc
            .issue(&Principal::user(Username::parse("kevin").unwrap()), now)
            .unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_payload;
        let tampered = parts.join(".");

        assert!(svc.verify(&tampered, now).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let issued = Utc::now();
        let token = svc
            .issue(&Principal::company(Handle::parse("rithm").unwrap()), issued)
            .unwrap();

        let later = issued + Duration::hours(2);
        assert!(matches!(
            svc.verify(&token, later),
            Err(TokenError::Claims(TokenValidationError::Expired))
        ));
    }

    proptest! {
        #[test]
        fn issued_identity_always_decodes(name in "[a-z0-9_-]{1,32}", as_company in any::<bool>()) {
            let svc = service();
            let now = Utc::now();
            let principal = if as_company {
                Principal::company(Handle::parse(name.clone()).unwrap())
            } else {
                Principal::user(Username::parse(name.clone()).unwrap())
            };

            let token = svc.issue(&principal, now).unwrap();
            let claims = svc.verify(&token, now).unwrap();
            prop_assert_eq!(claims.principal.identity(), name.as_str());
            prop_assert_eq!(claims.principal.kind(), principal.kind());
        }
    }
}
