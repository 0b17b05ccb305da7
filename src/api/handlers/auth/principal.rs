//! Authenticated principal extraction and the authorization gate.
//!
//! Flow Overview: pull the access token out of the request, verify it, and
//! resolve it to a sanitized principal that downstream handlers can use.
//! Every failed step short-circuits to the same `Unauthorized` rejection so
//! a caller cannot tell a bad signature from an expired token or a deleted
//! account.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{error::AuthError, session::extract_access_token, state::AuthState, store::Credential};

/// Sanitized view of a stored credential.
///
/// The password hash and refresh-token slot are stripped by construction and
/// can never appear in a serialized response.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Credential> for Principal {
    fn from(credential: Credential) -> Self {
        Self {
            id: credential.id,
            username: credential.username,
            email: credential.email,
            full_name: credential.full_name,
            avatar_url: credential.avatar_url,
            cover_image_url: credential.cover_image_url,
            created_at: credential.created_at,
            updated_at: credential.updated_at,
        }
    }
}

/// Resolve the calling principal from the request headers, or reject.
///
/// Store faults stay `Internal` (500); every authentication failure
/// collapses to a single 401.
pub async fn require_auth(headers: &HeaderMap, state: &AuthState) -> Result<Principal, AuthError> {
    let Some(token) = extract_access_token(headers) else {
        return Err(AuthError::Unauthorized("unauthorized request"));
    };

    state.service().authorize(&token).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        let now = Utc::now();
        Credential {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            full_name: "Alice Example".to_string(),
            avatar_url: "https://assets.example.com/avatar.png".to_string(),
            cover_image_url: String::new(),
            password_hash: "$argon2id$stub".to_string(),
            refresh_token: Some("live-refresh-token".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn principal_drops_secret_fields() {
        let principal = Principal::from(credential());
        let value = serde_json::to_value(&principal).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert!(keys.contains(&"username"));
        assert!(!keys.iter().any(|key| key.contains("password")));
        assert!(!keys.iter().any(|key| key.contains("refresh")));
    }

    #[test]
    fn principal_keeps_identity_fields() {
        let credential = credential();
        let id = credential.id;
        let principal = Principal::from(credential);

        assert_eq!(principal.id, id);
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.email, "alice@x.com");
    }
}
