use super::{AuthState, TOKEN_COOKIE};
use crate::auth::Claims;
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    get,
    path = "/verify",
    responses (
        (status = 200, description = "Token is valid", body = Claims),
        (status = 401, description = "Token missing, malformed or not signed by this service", body = String),
    ),
    security(
        ("bearer" = []),
    ),
    tag = "auth"
)]
#[instrument(skip(state, headers))]
pub async fn verify(state: Extension<Arc<AuthState>>, headers: HeaderMap) -> Response {
    let Some(token) = token_from_headers(&headers) else {
        return (StatusCode::UNAUTHORIZED, "token required").into_response();
    };

    match state.authenticator().verify(&token) {
        Ok(claims) => {
            debug!("token verified for {}", claims.username);
            Json(claims).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// `Authorization: Bearer <t>` wins over the `token` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(token_from_headers(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=a.b.c; lang=en"));
        assert_eq!(token_from_headers(&headers), Some("a.b.c".to_string()));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from.header.x"));
        headers.insert(COOKIE, HeaderValue::from_static("token=from.cookie.y"));
        assert_eq!(token_from_headers(&headers), Some("from.header.x".to_string()));
    }

    #[test]
    fn nothing_usable() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        headers.insert(COOKIE, HeaderValue::from_static("token=; tokenx=1"));
        assert_eq!(token_from_headers(&headers), None);
    }
}
