//! Account registration rules.

use crate::domain::error::DomainError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Field-level checks for a registration attempt. Uniqueness of username and
/// email is enforced by the store, not here.
pub fn validate_signup(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), DomainError> {
    if username.trim().is_empty() {
        return Err(DomainError::validation("username is required"));
    }
    if email.trim().is_empty() {
        return Err(DomainError::validation("email is required"));
    }
    if !email.contains('@') {
        return Err(DomainError::validation("email address is not valid"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password != confirm_password {
        return Err(DomainError::validation("passwords do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_signup() {
        assert!(validate_signup("maria", "maria@example.com", "s3cretpw", "s3cretpw").is_ok());
    }

    #[test]
    fn rejects_short_passwords() {
        let err = validate_signup("maria", "maria@example.com", "abc", "abc").unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn rejects_mismatched_confirmation() {
        let err =
            validate_signup("maria", "maria@example.com", "s3cretpw", "other").unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn rejects_blank_username_and_bad_email() {
        assert!(validate_signup("  ", "maria@example.com", "s3cretpw", "s3cretpw").is_err());
        assert!(validate_signup("maria", "not-an-email", "s3cretpw", "s3cretpw").is_err());
    }
}
