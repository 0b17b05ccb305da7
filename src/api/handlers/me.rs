//! Authenticated self-service endpoints.
//!
//! Flow Overview:
//! 1) Resolve the caller through the authorization gate.
//! 2) Apply allow-listed profile or asset updates via the session service.
//! 3) Return the sanitized principal.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::auth::{
    error::AuthError,
    principal::require_auth,
    types::{AvatarUpdateRequest, CoverImageUpdateRequest, ProfileUpdateRequest},
    AuthState,
};

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Return the authenticated principal.", body = super::auth::principal::Principal),
        (status = 401, description = "Missing or invalid access token.", body = super::auth::error::ErrorBody),
    ),
    tag = "me"
)]
pub async fn get_me(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    match require_auth(&headers, &state).await {
        Ok(principal) => (StatusCode::OK, Json(principal)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated.", body = super::auth::principal::Principal),
        (status = 400, description = "Invalid update payload.", body = super::auth::error::ErrorBody),
        (status = 401, description = "Missing or invalid access token.", body = super::auth::error::ErrorBody),
        (status = 409, description = "Email already exists.", body = super::auth::error::ErrorBody),
    ),
    tag = "me"
)]
pub async fn patch_me(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ProfileUpdateRequest>>,
) -> Response {
    let principal = match require_auth(&headers, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let Some(Json(payload)) = payload else {
        return AuthError::Validation("missing payload".to_string()).into_response();
    };

    match state.service().update_profile(principal.id, payload).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/me/avatar",
    request_body = AvatarUpdateRequest,
    responses(
        (status = 200, description = "Avatar replaced.", body = super::auth::principal::Principal),
        (status = 400, description = "Missing or unusable avatar asset.", body = super::auth::error::ErrorBody),
        (status = 401, description = "Missing or invalid access token.", body = super::auth::error::ErrorBody),
    ),
    tag = "me"
)]
pub async fn update_avatar(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<AvatarUpdateRequest>>,
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
        .update_avatar(principal.id, &payload.avatar)
        .await
    {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/me/cover-image",
    request_body = CoverImageUpdateRequest,
    responses(
        (status = 200, description = "Cover image replaced.", body = super::auth::principal::Principal),
        (status = 400, description = "Missing or unusable cover image asset.", body = super::auth::error::ErrorBody),
        (status = 401, description = "Missing or invalid access token.", body = super::auth::error::ErrorBody),
    ),
    tag = "me"
)]
pub async fn update_cover_image(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<CoverImageUpdateRequest>>,
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
        .update_cover_image(principal.id, &payload.cover_image)
        .await
    {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(err) => err.into_response(),
    }
}
