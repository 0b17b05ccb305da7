//! Credential store interface and records.
//!
//! The store holds exactly one record per principal, including the
//! single-slot refresh token. Implementations must keep each operation atomic
//! at the single-principal granularity; the compare-and-swap on the refresh
//! slot is what closes the concurrent-rotation race.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Durable record of one principal.
///
/// Carries the password hash and refresh-token slot, so it never leaves the
/// service unsanitized; outward-facing code works with
/// [`Principal`](super::principal::Principal) instead.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub password_hash: String,
    /// At most one live refresh token per principal; `None` means no active
    /// session.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to persist a new principal.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub password_hash: String,
}

/// Outcome when attempting to create a new principal.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Credential),
    DuplicateIdentity,
}

/// Outcome of a profile update that may collide with another identity.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Credential),
    DuplicateIdentity,
    Missing,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a principal whose username or email equals `identity`.
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Credential>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>>;

    /// Persist a new principal; identity uniqueness is enforced by the store,
    /// not by a prior read.
    async fn create(&self, new: NewCredential) -> Result<CreateOutcome>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool>;

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<UpdateOutcome>;

    async fn set_avatar_url(&self, id: Uuid, url: &str) -> Result<Option<Credential>>;

    async fn set_cover_image_url(&self, id: Uuid, url: &str) -> Result<Option<Credential>>;

    /// Replace or clear the refresh-token slot unconditionally.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool>;

    /// Install `next` only while the slot still holds `current`.
    ///
    /// Returns `false` when the slot changed underneath the caller, which the
    /// rotation logic reports as a replayed token.
    async fn swap_refresh_token(&self, id: Uuid, current: &str, next: &str) -> Result<bool>;
}

#[cfg(test)]
pub(crate) use memory::MemoryCredentialStore;


#[cfg(test)]
mod tests {
    use super::*;

    fn new_credential(username: &str, email: &str) -> NewCredential {
        NewCredential {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            avatar_url: "https://assets.example.com/avatar.png".to_string(),
            cover_image_url: String::new(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_identity() {
        let store = MemoryCredentialStore::new();

        let outcome = store.create(new_credential("alice", "alice@x.com")).await.unwrap();
        assert!(matches!(outcome, CreateOutcome::Created(_)));

        let outcome = store.create(new_credential("alice", "other@x.com")).await.unwrap();
        assert!(matches!(outcome, CreateOutcome::DuplicateIdentity));

        let outcome = store.create(new_credential("other", "alice@x.com")).await.unwrap();
        assert!(matches!(outcome, CreateOutcome::DuplicateIdentity));
    }

    #[tokio::test]
    async fn find_by_identity_matches_username_and_email() {
        let store = MemoryCredentialStore::new();
        store.create(new_credential("alice", "alice@x.com")).await.unwrap();

        assert!(store.find_by_identity("alice").await.unwrap().is_some());
        assert!(store.find_by_identity("alice@x.com").await.unwrap().is_some());
        assert!(store.find_by_identity("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn swap_refresh_token_requires_matching_slot() {
        let store = MemoryCredentialStore::new();
        let CreateOutcome::Created(credential) =
            store.create(new_credential("alice", "alice@x.com")).await.unwrap()
        else {
            panic!("expected creation");
        };

        // Empty slot: nothing to swap against.
        assert!(!store.swap_refresh_token(credential.id, "old", "new").await.unwrap());

        store.set_refresh_token(credential.id, Some("old")).await.unwrap();
        assert!(store.swap_refresh_token(credential.id, "old", "new").await.unwrap());
        assert_eq!(
            store.stored_refresh_token(credential.id).await.as_deref(),
            Some("new")
        );

        // A second swap with the superseded value must fail.
        assert!(!store.swap_refresh_token(credential.id, "old", "newer").await.unwrap());
    }

    #[tokio::test]
    async fn set_refresh_token_clears_slot() {
        let store = MemoryCredentialStore::new();
        let CreateOutcome::Created(credential) =
            store.create(new_credential("alice", "alice@x.com")).await.unwrap()
        else {
            panic!("expected creation");
        };

        store.set_refresh_token(credential.id, Some("live")).await.unwrap();
        store.set_refresh_token(credential.id, None).await.unwrap();
        assert_eq!(store.stored_refresh_token(credential.id).await, None);
    }
}
