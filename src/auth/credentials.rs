//! Syntactic credential checks.
//!
//! These run before any hashing or storage work. Lengths are counted in
//! characters, not bytes.

use super::{error::ValidationError, policy::Policy};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

/// A username/password pair scoped to a single request.
///
/// The password is held as a secret and redacted from `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Check both fields against `policy`, username first.
    ///
    /// # Errors
    /// Returns the first `ValidationError` found.
    pub fn validate(&self, policy: &Policy) -> Result<(), ValidationError> {
        validate_username(&self.username, policy.max_username_length())?;
        validate_password(self.password.expose_secret(), policy.max_password_length())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// # Errors
/// `UsernameEmpty`, `UsernameTooLong` or `UsernameInvalidChars`.
pub fn validate_username(username: &str, max_length: usize) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }

    if username.chars().count() > max_length {
        return Err(ValidationError::UsernameTooLong { max: max_length });
    }

    // Anchored on both ends: every character must be in the set, not just a prefix.
    if Regex::new(r"^[a-z0-9-]+$").is_ok_and(|re| re.is_match(username)) {
        Ok(())
    } else {
        Err(ValidationError::UsernameInvalidChars)
    }
}

/// # Errors
/// `PasswordEmpty` or `PasswordTooLong`.
pub fn validate_password(password: &str, max_length: usize) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }

    if password.chars().count() > max_length {
        return Err(ValidationError::PasswordTooLong { max: max_length });
    }

    Ok(())
}
