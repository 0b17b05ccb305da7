//! # Custodia (Session & Identity Service)
//!
//! `custodia` is the session and identity authority for a multi-user video
//! platform. It verifies credentials, issues and rotates the dual session
//! tokens (short-lived access / longer-lived refresh), and gates every
//! protected operation behind a per-request authorization check.
//!
//! ## Session Model
//!
//! - **Access tokens** are short-lived signed JWTs. They are never persisted;
//!   possession is proof of authorization until expiry.
//! - **Refresh tokens** are longer-lived signed JWTs that are *also* stored
//!   server-side in a single slot per user. A presented refresh token must
//!   match the stored slot exactly, which makes refresh tokens revocable and
//!   lets the service reject replayed tokens after a rotation.
//! - Rotation replaces the slot with an atomic compare-and-swap, so two
//!   concurrent refresh calls for the same user cannot both succeed.
//!
//! ## Authorization
//!
//! Protected handlers resolve the caller through
//! [`api::handlers::auth::principal::require_auth`], which collapses every
//! rejection cause (missing token, bad signature, expiry, deleted user) into
//! a single `401 Unauthorized` to avoid leaking which check failed.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
