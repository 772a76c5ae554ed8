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
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsBody,
    params(CookieQuery),
    responses (
        (status = 200, description = "Credentials accepted, body is the session token", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid credentials or wrong password", body = String),
        (status = 404, description = "Unknown username", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip(state, query, payload))]
pub async fn login(
    state: Extension<Arc<AuthState>>,
    query: Result<Query<CookieQuery>, QueryRejection>,
    payload: Option<Json<Value>>,
) -> Response {
    let skip_cookie = query.is_ok_and(|Query(query)| query.skip_cookie());
    let body = payload.map(|Json(value)| value);
    let credentials = match credentials_from_json(body.as_ref()) {
        Ok(credentials) => credentials,
        Err(err) => return AuthError::from(err).into_response(),
    };
    authenticate(&state, skip_cookie, &credentials).await
}

#[utoipa::path(
    get,
    path = "/login",
    params(CredentialsQuery),
    responses (
        (status = 200, description = "Credentials accepted, body is the session token", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid credentials or wrong password", body = String),
        (status = 404, description = "Unknown username", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip(state, query))]
pub async fn login_query(
    state: Extension<Arc<AuthState>>,
    query: Result<Query<CredentialsQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let skip_cookie = query.skip_cookie();
    let credentials = match credentials_from_query(query) {
        Ok(credentials) => credentials,
        Err(err) => return AuthError::from(err).into_response(),
    };
    authenticate(&state, skip_cookie, &credentials).await
}

async fn authenticate(state: &AuthState, skip_cookie: bool, credentials: &Credentials) -> Response {
    state
        .authenticator()
        .login(credentials)
        .await
        .map_or_else(IntoResponse::into_response, |token| {
            token_response(state, skip_cookie, token)
        })
}
