//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::principal::Principal;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    /// Staged reference for the required avatar asset.
    pub avatar: String,
    /// Staged reference for the optional cover image asset.
    pub cover_image: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

// One-way like Principal itself: responses are never parsed back.
#[derive(ToSchema, Serialize, Debug)]
pub struct LoginResponse {
    pub user: Principal,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdateRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AvatarUpdateRequest {
    /// Staged reference for the replacement avatar asset.
    pub avatar: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CoverImageUpdateRequest {
    /// Staged reference for the replacement cover image asset.
    pub cover_image: String,
}

impl LoginResponse {
    pub(super) fn new(user: Principal, access_token: String, refresh_token: String) -> Self {
        Self {
            user,
            access_token,
            refresh_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_request_round_trips() -> Result<()> {
        let request = LoginRequest {
            username: Some("alice".to_string()),
            email: None,
            password: "pw123".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let username = value
            .get("username")
            .and_then(serde_json::Value::as_str)
            .context("missing username")?;
        assert_eq!(username, "alice");
        let decoded: LoginRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, "pw123");
        Ok(())
    }

    #[test]
    fn refresh_request_tolerates_missing_token() -> Result<()> {
        let decoded: RefreshRequest = serde_json::from_value(serde_json::json!({}))?;
        assert_eq!(decoded.refresh_token, None);
        Ok(())
    }

    #[test]
    fn profile_update_rejects_unknown_fields() {
        let result: Result<ProfileUpdateRequest, _> = serde_json::from_value(serde_json::json!({
            "full_name": "Alice",
            "password": "sneaky"
        }));
        assert!(result.is_err());
    }
}
