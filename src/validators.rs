/// Input validators for registration and profile fields
///
/// Length limits bound adversarially large inputs; format checks keep
/// identifiers canonical. Successful validation returns the canonical form
/// (trimmed, usernames lowercased).

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;
const MAX_FULL_NAME_LENGTH: usize = 256;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    // Lowercase handle: starts alphanumeric, then alphanumerics and ._-
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-z0-9][a-z0-9._-]*$").unwrap();
}

/// Validates an email address and returns its canonical (trimmed) form.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a username and returns it trimmed and lowercased.
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let canonical = username.trim().to_lowercase();

    if canonical.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }
    if canonical.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort(
            "username".to_string(),
            MIN_USERNAME_LENGTH,
        ));
    }
    if canonical.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }
    if !USERNAME_REGEX.is_match(&canonical) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(canonical)
}

/// Validates a display name and returns its trimmed form.
pub fn is_valid_full_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("full_name".to_string()));
    }
    if trimmed.len() > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::TooLong(
            "full_name".to_string(),
            MAX_FULL_NAME_LENGTH,
        ));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("full_name".to_string()));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
    }

    #[test]
    fn test_username_is_lowercased() {
        assert_eq!(is_valid_username("BobMarley").unwrap(), "bobmarley");
        assert_eq!(is_valid_username("  bob.marley  ").unwrap(), "bob.marley");
    }

    #[test]
    fn test_invalid_username() {
        assert!(is_valid_username("ab").is_err());
        assert!(is_valid_username("_leading").is_err());
        assert!(is_valid_username("has space").is_err());
        assert!(is_valid_username(&"a".repeat(31)).is_err());
    }

    #[test]
    fn test_valid_full_name() {
        assert!(is_valid_full_name("John Doe").is_ok());
        assert!(is_valid_full_name("Jean-Pierre O'Brien").is_ok());
    }

    #[test]
    fn test_full_name_limits() {
        assert!(is_valid_full_name("").is_err());
        assert!(is_valid_full_name(&"a".repeat(257)).is_err());
        assert!(is_valid_full_name("Name\0with\0null").is_err());
    }
}
