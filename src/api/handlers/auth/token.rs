//! Signed, time-bounded session tokens.
//!
//! Access and refresh tokens are minted and verified by independent key
//! pairs, each with its own TTL. Both carry the same minimal claims: the
//! principal id, issue time, and expiry. The codec is built once from the
//! explicit [`AuthConfig`](super::state::AuthConfig) rather than reading the
//! process environment.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use super::state::AuthConfig;

/// Claims carried by both token families.
///
/// `jti` makes every minted token unique, so a rotation issued within the
/// same second as its predecessor still produces a distinct value.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
    jti: Uuid,
}

pub(super) struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    access_ttl_seconds: i64,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    refresh_ttl_seconds: i64,
}

impl TokenCodec {
    pub(super) fn from_config(config: &AuthConfig) -> Self {
        let access_secret = config.access_token_secret().expose_secret().as_bytes();
        let refresh_secret = config.refresh_token_secret().expose_secret().as_bytes();

        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            access_ttl_seconds: config.access_token_ttl_seconds(),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            refresh_ttl_seconds: config.refresh_token_ttl_seconds(),
        }
    }

    pub(super) fn mint_access(&self, principal_id: Uuid) -> Result<String> {
        mint(&self.access_encoding, principal_id, self.access_ttl_seconds)
    }

    pub(super) fn mint_refresh(&self, principal_id: Uuid) -> Result<String> {
        mint(&self.refresh_encoding, principal_id, self.refresh_ttl_seconds)
    }

    pub(super) fn verify_access(&self, token: &str) -> Option<Uuid> {
        verify(&self.access_decoding, token)
    }

    pub(super) fn verify_refresh(&self, token: &str) -> Option<Uuid> {
        verify(&self.refresh_decoding, token)
    }
}

fn mint(key: &EncodingKey, principal_id: Uuid, ttl_seconds: i64) -> Result<String> {
    let iat = now_unix_seconds();
    let claims = Claims {
        sub: principal_id,
        iat,
        exp: iat.saturating_add(ttl_seconds),
        jti: Uuid::new_v4(),
    };

    encode(&Header::default(), &claims, key).context("failed to sign session token")
}

/// Signature and expiry check; any failure yields `None` without detail.
fn verify(key: &DecodingKey, token: &str) -> Option<Uuid> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, key, &validation)
        .ok()
        .map(|data| data.claims.sub)
}

/// Unix seconds for token stamping and TTL validation.
fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_codec() -> TokenCodec {
        let config = AuthConfig::new(
            SecretString::from("access-secret-access-secret-1234"),
            SecretString::from("refresh-secret-refresh-secret-12"),
            "http://localhost:3000".to_string(),
        );
        TokenCodec::from_config(&config)
    }

    #[test]
    fn access_token_round_trips() {
        let codec = test_codec();
        let id = Uuid::new_v4();
        let token = codec.mint_access(id).unwrap();
        assert_eq!(codec.verify_access(&token), Some(id));
    }

    #[test]
    fn refresh_token_round_trips() {
        let codec = test_codec();
        let id = Uuid::new_v4();
        let token = codec.mint_refresh(id).unwrap();
        assert_eq!(codec.verify_refresh(&token), Some(id));
    }

    #[test]
    fn token_families_are_not_interchangeable() {
        let codec = test_codec();
        let id = Uuid::new_v4();

        let access = codec.mint_access(id).unwrap();
        let refresh = codec.mint_refresh(id).unwrap();

        assert_eq!(codec.verify_refresh(&access), None);
        assert_eq!(codec.verify_access(&refresh), None);
    }

    #[test]
    fn expired_token_rejected() {
        let codec = test_codec();
        let id = Uuid::new_v4();

        let expired = mint(&codec.access_encoding, id, -120).unwrap();
        assert_eq!(codec.verify_access(&expired), None);
    }

    #[test]
    fn tokens_minted_back_to_back_are_distinct() {
        let codec = test_codec();
        let id = Uuid::new_v4();

        let first = codec.mint_refresh(id).unwrap();
        let second = codec.mint_refresh(id).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_token_rejected() {
        let codec = test_codec();
        assert_eq!(codec.verify_access("not-a-token"), None);
        assert_eq!(codec.verify_refresh(""), None);
    }
}
