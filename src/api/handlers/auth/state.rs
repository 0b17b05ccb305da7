//! Auth state and configuration.

use secrecy::SecretString;
use std::sync::Arc;

use super::{assets::AssetStore, service::SessionService, store::CredentialStore};

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 10 * 24 * 60 * 60;

/// Explicit configuration for token minting and cookie handling.
///
/// Signing secrets and lifetimes are injected here at construction; nothing
/// in the session core reads the process environment.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_token_secret: SecretString,
    refresh_token_secret: SecretString,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    frontend_base_url: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(
        access_token_secret: SecretString,
        refresh_token_secret: SecretString,
        frontend_base_url: String,
    ) -> Self {
        Self {
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            frontend_base_url,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    pub(super) fn access_token_secret(&self) -> &SecretString {
        &self.access_token_secret
    }

    pub(super) fn refresh_token_secret(&self) -> &SecretString {
        &self.refresh_token_secret
    }

    pub(super) fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    pub(super) fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    pub(super) fn cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Shared per-process auth state: configuration plus the session service.
pub struct AuthState {
    config: AuthConfig,
    service: SessionService,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn CredentialStore>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        let service = SessionService::new(&config, store, assets);
        Self { config, service }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn service(&self) -> &SessionService {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(frontend: &str) -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access-secret-access-secret-1234"),
            SecretString::from("refresh-secret-refresh-secret-12"),
            frontend.to_string(),
        )
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = test_config("https://watch.example.com");

        assert_eq!(
            config.access_token_ttl_seconds(),
            DEFAULT_ACCESS_TOKEN_TTL_SECONDS
        );
        assert_eq!(
            config.refresh_token_ttl_seconds(),
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS
        );
        assert_eq!(config.frontend_base_url(), "https://watch.example.com");

        let config = config
            .with_access_token_ttl_seconds(60)
            .with_refresh_token_ttl_seconds(120);

        assert_eq!(config.access_token_ttl_seconds(), 60);
        assert_eq!(config.refresh_token_ttl_seconds(), 120);
    }

    #[test]
    fn cookies_secure_only_over_https() {
        assert!(test_config("https://watch.example.com").cookie_secure());
        assert!(!test_config("http://localhost:3000").cookie_secure());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = test_config("http://localhost:3000");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("access-secret-access-secret-1234"));
        assert!(!rendered.contains("refresh-secret-refresh-secret-12"));
    }
}
