use super::{
    credentials_from_json, credentials_from_query, token_response, AuthState, CookieQuery,
    CredentialsBody, CredentialsQuery,
};
use crate::auth::{AuthError, Credentials};
use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    post,
    path = "/register",
    request_body = CredentialsBody,
    params(CookieQuery),
    responses (
        (status = 200, description = "User created, body is the session token", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid credentials or user already exists", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip(state, query, payload))]
pub async fn register(
    state: Extension<Arc<AuthState>>,
    query: Result<Query<CookieQuery>, QueryRejection>,
    payload: Option<Json<Value>>,
) -> Response {
    let skip_cookie = query.is_ok_and(|Query(query)| query.skip_cookie());
    let body = payload.map(|Json(value)| value);
    match credentials_from_json(body.as_ref()) {
        Ok(credentials) => create(&state, skip_cookie, credentials).await,
        Err(err) => AuthError::from(err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/register",
    params(CredentialsQuery),
    responses (
        (status = 200, description = "User created, body is the session token", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid credentials or user already exists", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip(state, query))]
pub async fn register_query(
    state: Extension<Arc<AuthState>>,
    query: Result<Query<CredentialsQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let skip_cookie = query.skip_cookie();
    match credentials_from_query(query) {
        Ok(credentials) => create(&state, skip_cookie, credentials).await,
        Err(err) => AuthError::from(err).into_response(),
    }
}

async fn create(state: &AuthState, skip_cookie: bool, credentials: Credentials) -> Response {
    match state.authenticator().register(&credentials).await {
        Ok(token) => {
            debug!("registered {}", credentials.username());
            token_response(state, skip_cookie, token)
        }
        Err(err) => err.into_response(),
    }
}
