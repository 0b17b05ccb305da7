//! Account registration endpoint.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{error::AuthError, state::AuthState, types::RegisterRequest};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = super::principal::Principal),
        (status = 400, description = "Missing fields or unusable avatar", body = super::error::ErrorBody),
        (status = 409, description = "Username or email already exists", body = super::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn register(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return AuthError::Validation("missing payload".to_string()).into_response();
    };

    match state.service().register(payload).await {
        Ok(principal) => (StatusCode::CREATED, Json(principal)).into_response(),
        Err(err) => err.into_response(),
    }
}
