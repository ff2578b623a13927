//! `jobly-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how
//! to sign and verify identity tokens, hash credentials, and decide whether a
//! principal may act on a resource.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod token;

pub use authorize::{authorize, AuthzError, Guard, Requirement};
pub use claims::{validate_claims, TokenClaims, TokenValidationError};
pub use password::{Argon2Hasher, CredentialHasher, HashError};
#[cfg(any(test, feature = "test-util"))]
pub use password::PlaintextHasher;
pub use principal::{Principal, PrincipalKind};
pub use token::{Hs256TokenService, TokenError, TokenService};
