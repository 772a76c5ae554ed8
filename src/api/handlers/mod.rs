//! HTTP handlers and the pieces they share: request field extraction, the
//! token response with its cookie, and the error → status mapping.

pub mod health;
pub mod login;
pub mod register;
pub mod verify;

use crate::auth::{AuthError, Authenticator, Credentials, ValidationError};
use axum::{
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

pub const TOKEN_COOKIE: &str = "token";
pub const DEFAULT_COOKIE_MAX_AGE_SECONDS: u64 = 90 * 24 * 60 * 60;

/// Request-independent state handed to every handler.
#[derive(Debug, Clone)]
pub struct AuthState {
    authenticator: Authenticator,
    cookie_max_age_seconds: u64,
}

impl AuthState {
    #[must_use]
    pub const fn new(authenticator: Authenticator) -> Self {
        Self {
            authenticator,
            cookie_max_age_seconds: DEFAULT_COOKIE_MAX_AGE_SECONDS,
        }
    }

    #[must_use]
    pub const fn with_cookie_max_age_seconds(mut self, seconds: u64) -> Self {
        self.cookie_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    #[must_use]
    pub const fn cookie_max_age_seconds(&self) -> u64 {
        self.cookie_max_age_seconds
    }
}

/// JSON body accepted by `POST /register` and `POST /login`.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CredentialsBody {
    username: String,
    #[schema(format = Password)]
    password: String,
}

/// Query string of the POST endpoints.
#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct CookieQuery {
    /// Present with any value to skip the `token` cookie.
    #[serde(rename = "no-cookie")]
    no_cookie: Option<String>,
}

impl CookieQuery {
    #[must_use]
    pub const fn skip_cookie(&self) -> bool {
        self.no_cookie.is_some()
    }
}

/// Query string of the GET variants, credentials included.
#[derive(IntoParams, Deserialize, Default)]
#[into_params(parameter_in = Query)]
pub struct CredentialsQuery {
    username: Option<String>,
    password: Option<String>,
    /// Present with any value to skip the `token` cookie.
    #[serde(rename = "no-cookie")]
    no_cookie: Option<String>,
}

impl CredentialsQuery {
    #[must_use]
    pub const fn skip_cookie(&self) -> bool {
        self.no_cookie.is_some()
    }
}

#[must_use]
pub const fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Validation(_) | AuthError::UserAlreadyExists | AuthError::WrongCredential => {
            StatusCode::BAD_REQUEST
        }
        AuthError::NotFound => StatusCode::NOT_FOUND,
        AuthError::TokenMalformed | AuthError::TokenSignatureMismatch => StatusCode::UNAUTHORIZED,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if let Self::Internal(source) = &self {
            error!("request failed: {source:?}");
        }
        (status, self.to_string()).into_response()
    }
}

/// Read `username` and `password` from a JSON body.
///
/// # Errors
/// `MissingPayload` when the body is absent, not an object or empty;
/// `MissingField`/`InvalidField` when a field is absent or not a string.
pub fn credentials_from_json(body: Option<&Value>) -> Result<Credentials, ValidationError> {
    let Some(object) = body.and_then(Value::as_object).filter(|o| !o.is_empty()) else {
        return Err(ValidationError::MissingPayload);
    };

    let username = string_field(object, "username")?;
    let password = string_field(object, "password")?;
    Ok(Credentials::new(username, password))
}

/// Read `username` and `password` from query parameters.
///
/// # Errors
/// `MissingPayload` when neither is given, `MissingField` when one is absent.
pub fn credentials_from_query(query: CredentialsQuery) -> Result<Credentials, ValidationError> {
    match (query.username, query.password) {
        (None, None) => Err(ValidationError::MissingPayload),
        (None, Some(_)) => Err(ValidationError::MissingField("username")),
        (Some(_), None) => Err(ValidationError::MissingField("password")),
        (Some(username), Some(password)) => Ok(Credentials::new(username, password)),
    }
}

fn string_field(object: &Map<String, Value>, name: &'static str) -> Result<String, ValidationError> {
    match object.get(name) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(name)),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(ValidationError::InvalidField(name)),
    }
}

/// 200 with the token as body, plus a `token` cookie unless `no-cookie` was passed.
pub fn token_response(state: &AuthState, skip_cookie: bool, token: String) -> Response {
    let mut headers = HeaderMap::new();
    if !skip_cookie {
        let cookie = format!(
            "{TOKEN_COOKIE}={token}; Path=/; Max-Age={}; SameSite=Lax",
            state.cookie_max_age_seconds()
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.insert(SET_COOKIE, value);
            }
            Err(err) => error!("Failed to build token cookie: {}", err),
        }
    }

    (StatusCode::OK, headers, token).into_response()
}
