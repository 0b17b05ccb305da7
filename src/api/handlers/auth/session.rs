//! Session endpoints for cookie and bearer auth.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::{
    error::AuthError,
    principal::require_auth,
    service::TokenPair,
    state::{AuthConfig, AuthState},
    types::{
        ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshRequest,
        RefreshResponse,
    },
};

const ACCESS_COOKIE_NAME: &str = "access_token";
const REFRESH_COOKIE_NAME: &str = "refresh_token";

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing identifier or payload", body = super::error::ErrorBody),
        (status = 401, description = "Invalid credentials", body = super::error::ErrorBody),
        (status = 404, description = "No such user", body = super::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn login(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return AuthError::Validation("missing payload".to_string()).into_response();
    };

    match state.service().login(payload).await {
        Ok((user, tokens)) => {
            let headers = session_cookie_headers(state.config(), &tokens);
            let access_token = tokens.access_token;
            let refresh_token = tokens.refresh_token;
            (
                StatusCode::OK,
                headers,
                Json(LoginResponse::new(user, access_token, refresh_token)),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = RefreshResponse),
        (status = 401, description = "Missing, invalid, or replayed refresh token", body = super::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Response {
    // Cookie first, then the request body (the mobile-client path).
    let presented = extract_refresh_token(&headers).or_else(|| {
        payload
            .and_then(|Json(body)| body.refresh_token)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    });

    let Some(presented) = presented else {
        return AuthError::Unauthorized("missing refresh token").into_response();
    };

    match state.service().refresh(&presented).await {
        Ok(tokens) => {
            let headers = session_cookie_headers(state.config(), &tokens);
            let body = RefreshResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            };
            (StatusCode::OK, headers, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared"),
        (status = 401, description = "Missing or invalid access token", body = super::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    let principal = match require_auth(&headers, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    if let Err(err) = state.service().logout(principal.id).await {
        return err.into_response();
    }

    // Both cookies are cleared together, even if no session was active.
    let mut response_headers = HeaderMap::new();
    let secure = state.config().cookie_secure();
    append_cookie(&mut response_headers, clear_cookie(ACCESS_COOKIE_NAME, secure));
    append_cookie(
        &mut response_headers,
        clear_cookie(REFRESH_COOKIE_NAME, secure),
    );

    (StatusCode::NO_CONTENT, response_headers).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Missing passwords", body = super::error::ErrorBody),
        (status = 401, description = "Wrong password or invalid access token", body = super::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Response {
    let principal = match require_auth(&headers, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let Some(Json(payload)) = payload else {
        return AuthError::Validation("missing payload".to_string()).into_response();
    };

    match state
        .service()
        .change_password(principal.id, &payload.old_password, &payload.new_password)
        .await
    {
        Ok(()) => {
            // The refresh slot was cleared; drop the matching cookie. The
            // access cookie stays valid until expiry.
            let mut response_headers = HeaderMap::new();
            append_cookie(
                &mut response_headers,
                clear_cookie(REFRESH_COOKIE_NAME, state.config().cookie_secure()),
            );
            let body = MessageResponse {
                message: "password changed".to_string(),
            };
            (StatusCode::OK, response_headers, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Set-Cookie headers for a freshly minted token pair.
fn session_cookie_headers(config: &AuthConfig, tokens: &TokenPair) -> HeaderMap {
    let secure = config.cookie_secure();
    let mut headers = HeaderMap::new();
    append_cookie(
        &mut headers,
        session_cookie(
            ACCESS_COOKIE_NAME,
            &tokens.access_token,
            config.access_token_ttl_seconds(),
            secure,
        ),
    );
    append_cookie(
        &mut headers,
        session_cookie(
            REFRESH_COOKIE_NAME,
            &tokens.refresh_token,
            config.refresh_token_ttl_seconds(),
            secure,
        ),
    );
    headers
}

fn append_cookie(headers: &mut HeaderMap, cookie: Result<HeaderValue, InvalidHeaderValue>) {
    match cookie {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
        }
    }
}

/// Build a secure `HttpOnly` cookie for one session token.
fn session_cookie(
    name: &str,
    token: &str,
    max_age_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the access token out of the request.
///
/// The cookie takes precedence over the `Authorization` header when both are
/// present.
pub(super) fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_COOKIE_NAME).or_else(|| bearer_token(headers))
}

pub(super) fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, REFRESH_COOKIE_NAME)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_wins_over_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("access_token=from-cookie; other=x"),
        );
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        assert_eq!(
            extract_access_token(&headers).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn bearer_header_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

        assert_eq!(extract_access_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_token_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_access_token(&headers), None);
        assert_eq!(extract_refresh_token(&headers), None);
    }

    #[test]
    fn empty_bearer_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_access_token(&headers), None);
    }

    #[test]
    fn refresh_cookie_extracted_by_name() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("access_token=a; refresh_token=r"),
        );
        assert_eq!(extract_refresh_token(&headers).as_deref(), Some("r"));
    }

    #[test]
    fn session_cookie_shape() {
        let cookie = session_cookie(ACCESS_COOKIE_NAME, "tok", 900, true).unwrap();
        let rendered = cookie.to_str().unwrap();
        assert!(rendered.starts_with("access_token=tok; "));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Max-Age=900"));
        assert!(rendered.ends_with("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie(REFRESH_COOKIE_NAME, false).unwrap();
        let rendered = cookie.to_str().unwrap();
        assert!(rendered.starts_with("refresh_token=; "));
        assert!(rendered.contains("Max-Age=0"));
        assert!(!rendered.contains("Secure"));
    }
}
