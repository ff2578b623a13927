//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic input/record failures. Storage and
/// transport concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (missing field, malformed value).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. bad handle characters).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Reject blank (empty or whitespace-only) required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Basic email shape check: `local@domain` with both parts non-empty.
pub(crate) fn require_email(value: &str) -> DomainResult<()> {
    match value.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(DomainError::validation("email must look like local@domain")),
    }
}

pub fn validate_password(value: &str) -> DomainResult<()> {
    if value.is_empty() {
        return Err(DomainError::validation("password is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(require_email("ya@gmail.com").is_ok());
        assert!(require_email("  ya@gmail.com ").is_ok());
        assert!(require_email("yagmail.com").is_err());
        assert!(require_email("@gmail.com").is_err());
        assert!(require_email("ya@").is_err());
        assert!(require_email("a@b@c").is_err());
    }

    #[test]
    fn blank_text_rejected() {
        assert!(require_text("name", "   ").is_err());
        assert!(require_text("name", "Rithm").is_ok());
    }
}
