//! Typed error kinds for session and account operations.
//!
//! Every boundary operation surfaces exactly one of these kinds; callers
//! pattern-match on the kind instead of catching exceptions. The HTTP mapping
//! lives here so handlers can bubble errors straight into a response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),
    /// Username or email already taken.
    #[error("{0}")]
    Conflict(String),
    /// No principal matches the supplied identifier.
    #[error("{0}")]
    NotFound(String),
    /// Password verification failed.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Missing, invalid, or replayed token.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// Store inconsistency or another server fault. The source is logged,
    /// never returned to the caller.
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured failure body returned by every auth endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!("Internal auth failure: {source:?}");
        }

        let status = self.status();
        let body = ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_maps_every_kind() {
        assert_eq!(
            AuthError::Validation("bad".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Conflict("dup".to_string()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::NotFound("missing".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Unauthorized("nope").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Internal(anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_display_does_not_leak_source() {
        let err = AuthError::Internal(anyhow!("connection refused to 10.0.0.7"));
        assert_eq!(err.to_string(), "internal server error");
    }

    #[test]
    fn anyhow_errors_convert_to_internal() {
        let err: AuthError = anyhow!("read-back failed").into();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
