//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use crate::api::handlers::{auth, health, me};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register::register,
        auth::session::login,
        auth::session::refresh,
        auth::session::logout,
        auth::session::change_password,
        me::get_me,
        me::patch_me,
        me::update_avatar,
        me::update_cover_image,
    ),
    components(schemas(
        health::Health,
        auth::error::ErrorBody,
        auth::principal::Principal,
        auth::types::RegisterRequest,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::RefreshRequest,
        auth::types::RefreshResponse,
        auth::types::ChangePasswordRequest,
        auth::types::MessageResponse,
        auth::types::ProfileUpdateRequest,
        auth::types::AvatarUpdateRequest,
        auth::types::CoverImageUpdateRequest,
    )),
    tags(
        (name = "auth", description = "Session lifecycle: register, login, refresh, logout"),
        (name = "me", description = "Authenticated self-service"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_session_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/v1/auth/login"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/auth/refresh"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/auth/logout"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/me"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }
}
