use super::token::TokenError;
use crate::store::StoreError;
use thiserror::Error;

/// Rejected input, detected before any hashing or storage work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("username and password required")]
    MissingPayload,
    #[error("{0} required")]
    MissingField(&'static str),
    #[error("invalid {0}")]
    InvalidField(&'static str),
    #[error("username can not be empty")]
    UsernameEmpty,
    #[error("username too long, should be at most {max} characters")]
    UsernameTooLong { max: usize },
    #[error("username can only contain lowercase letters, digits and dash")]
    UsernameInvalidChars,
    #[error("password can not be empty")]
    PasswordEmpty,
    #[error("password too long, should be at most {max} characters")]
    PasswordTooLong { max: usize },
}

impl ValidationError {
    /// Name of the offending request field, if the error is about a single one.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingPayload => None,
            Self::MissingField(field) | Self::InvalidField(field) => Some(field),
            Self::UsernameEmpty | Self::UsernameTooLong { .. } | Self::UsernameInvalidChars => {
                Some("username")
            }
            Self::PasswordEmpty | Self::PasswordTooLong { .. } => Some("password"),
        }
    }
}

/// Outcome kinds of the register/login/verify flows.
///
/// Business errors carry their kind from the point of detection up to the HTTP
/// boundary unchanged; anything unanticipated becomes `Internal`, whose source
/// is logged server-side and never shown to the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not found")]
    NotFound,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("wrong password")]
    WrongCredential,
    #[error("malformed token")]
    TokenMalformed,
    #[error("token signature mismatch")]
    TokenSignatureMismatch,
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => Self::TokenMalformed,
            TokenError::SignatureMismatch => Self::TokenSignatureMismatch,
            other => Self::Internal(other.into()),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::UserAlreadyExists,
            StoreError::Internal(source) => Self::Internal(source),
        }
    }
}
