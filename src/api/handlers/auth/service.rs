//! Core session lifecycle: registration, login, refresh rotation, logout,
//! and password changes.
//!
//! The service owns the token codec and talks to the credential and asset
//! stores through their traits. Every operation returns a typed
//! [`AuthError`] kind, and there are no partial successes: refresh either
//! returns a fully rotated pair or changes nothing server-side.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::handlers::valid_email;

use super::{
    assets::AssetStore,
    error::AuthError,
    password::{hash_password, verify_password},
    principal::Principal,
    state::AuthConfig,
    store::{CreateOutcome, CredentialStore, NewCredential, UpdateOutcome},
    token::TokenCodec,
    types::{LoginRequest, ProfileUpdateRequest, RegisterRequest},
};

/// Freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    assets: Arc<dyn AssetStore>,
    tokens: TokenCodec,
}

impl SessionService {
    pub(super) fn new(
        config: &AuthConfig,
        store: Arc<dyn CredentialStore>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            store,
            assets,
            tokens: TokenCodec::from_config(config),
        }
    }

    /// Create a new principal.
    ///
    /// The avatar reference is required and must resolve through the asset
    /// store; the cover image is optional and stored empty when missing.
    ///
    /// # Errors
    /// `Validation` for empty fields or a failed avatar upload, `Conflict`
    /// for a taken username/email, `Internal` if the created record cannot
    /// be read back.
    pub async fn register(&self, request: RegisterRequest) -> Result<Principal, AuthError> {
        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_string();
        let full_name = request.full_name.trim().to_string();
        let password = request.password.trim();

        if username.is_empty() || email.is_empty() || full_name.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("all fields are required".to_string()));
        }
        if !valid_email(&email) {
            return Err(AuthError::Validation("invalid email".to_string()));
        }

        let avatar_reference = request.avatar.trim();
        if avatar_reference.is_empty() {
            return Err(AuthError::Validation("avatar is required".to_string()));
        }
        let Some(avatar_url) = self.assets.upload(avatar_reference).await? else {
            return Err(AuthError::Validation(
                "avatar could not be stored".to_string(),
            ));
        };

        // A failed cover upload is not fatal; the field stays empty.
        let cover_image_url = match request.cover_image.as_deref().map(str::trim) {
            Some(reference) if !reference.is_empty() => {
                self.assets.upload(reference).await?.unwrap_or_default()
            }
            _ => String::new(),
        };

        let password_hash = hash_password(password)?;

        let created = match self
            .store
            .create(NewCredential {
                username: username.clone(),
                email,
                full_name,
                avatar_url,
                cover_image_url,
                password_hash,
            })
            .await?
        {
            CreateOutcome::Created(credential) => credential,
            CreateOutcome::DuplicateIdentity => {
                return Err(AuthError::Conflict(
                    "username or email already exists".to_string(),
                ));
            }
        };

        // Read back the stored record; a missing row here is a server fault,
        // not a caller mistake.
        let fetched = self
            .store
            .find_by_id(created.id)
            .await?
            .ok_or_else(|| AuthError::Internal(anyhow!("created principal vanished on read-back")))?;

        info!("Registered principal {} ({username})", fetched.id);

        Ok(Principal::from(fetched))
    }

    /// Verify credentials and open a session.
    ///
    /// Persisting the fresh refresh token overwrites any prior slot value,
    /// which implicitly revokes an older session.
    ///
    /// # Errors
    /// `Validation` when no identifier is supplied, `NotFound` for an
    /// unknown identifier, `InvalidCredentials` for a bad password.
    pub async fn login(&self, request: LoginRequest) -> Result<(Principal, TokenPair), AuthError> {
        let username = request
            .username
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase);
        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        // At least one identifier; username wins when both are present.
        let Some(identity) = username.or(email) else {
            return Err(AuthError::Validation(
                "username or email is required".to_string(),
            ));
        };

        let credential = self
            .store
            .find_by_identity(&identity)
            .await?
            .ok_or_else(|| AuthError::NotFound("no such user".to_string()))?;

        if !verify_password(&request.password, &credential.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.mint_pair(credential.id)?;
        self.store
            .set_refresh_token(credential.id, Some(&pair.refresh_token))
            .await?;

        debug!("Session opened for principal {}", credential.id);

        Ok((Principal::from(credential), pair))
    }

    /// Rotate a presented refresh token into a new token pair.
    ///
    /// The presented token must verify *and* match the stored slot. A
    /// superseded token is treated as a replay: the slot is cleared so the
    /// holder of the live token must re-authenticate too. Rotation itself is
    /// a compare-and-swap, so two concurrent calls cannot both win.
    ///
    /// # Errors
    /// `Unauthorized` for every rejection cause.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let Some(principal_id) = self.tokens.verify_refresh(presented) else {
            return Err(AuthError::Unauthorized("invalid refresh token"));
        };

        let credential = self
            .store
            .find_by_id(principal_id)
            .await?
            .ok_or(AuthError::Unauthorized("invalid refresh token"))?;

        match credential.refresh_token.as_deref() {
            Some(stored) if stored == presented => {}
            _ => {
                // Replay detected: drop the live session as well.
                self.store.set_refresh_token(principal_id, None).await?;
                return Err(AuthError::Unauthorized(
                    "refresh token expired or already used",
                ));
            }
        }

        let pair = self.mint_pair(principal_id)?;
        let swapped = self
            .store
            .swap_refresh_token(principal_id, presented, &pair.refresh_token)
            .await?;
        if !swapped {
            // Lost the rotation race; the presented token is superseded.
            return Err(AuthError::Unauthorized(
                "refresh token expired or already used",
            ));
        }

        debug!("Session rotated for principal {principal_id}");

        Ok(pair)
    }

    /// Close the principal's session by clearing the refresh slot.
    ///
    /// Idempotent: logging out with no active session is still a success.
    pub async fn logout(&self, principal_id: Uuid) -> Result<(), AuthError> {
        self.store.set_refresh_token(principal_id, None).await?;
        info!("Session closed for principal {principal_id}");
        Ok(())
    }

    /// Replace the principal's password after verifying the current one.
    ///
    /// The refresh slot is cleared so the old session cannot be extended;
    /// outstanding access tokens stay valid until expiry by design.
    ///
    /// # Errors
    /// `InvalidCredentials` when the old password does not match.
    pub async fn change_password(
        &self,
        principal_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if old_password.trim().is_empty() || new_password.trim().is_empty() {
            return Err(AuthError::Validation(
                "old and new passwords are required".to_string(),
            ));
        }

        let credential = self
            .store
            .find_by_id(principal_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("no such user".to_string()))?;

        if !verify_password(old_password, &credential.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = hash_password(new_password)?;
        self.store
            .update_password(principal_id, &password_hash)
            .await?;
        self.store.set_refresh_token(principal_id, None).await?;

        info!("Password changed for principal {principal_id}");

        Ok(())
    }

    /// Resolve an access token to its sanitized principal.
    ///
    /// # Errors
    /// `Unauthorized` for a bad token or a principal deleted after issuance.
    pub async fn authorize(&self, access_token: &str) -> Result<Principal, AuthError> {
        let Some(principal_id) = self.tokens.verify_access(access_token) else {
            return Err(AuthError::Unauthorized("invalid access token"));
        };

        let credential = self
            .store
            .find_by_id(principal_id)
            .await?
            .ok_or(AuthError::Unauthorized("invalid access token"))?;

        Ok(Principal::from(credential))
    }

    /// Apply allow-listed profile updates.
    ///
    /// # Errors
    /// `Validation` when nothing is updated or the email is malformed,
    /// `Conflict` when the new email is taken.
    pub async fn update_profile(
        &self,
        principal_id: Uuid,
        request: ProfileUpdateRequest,
    ) -> Result<Principal, AuthError> {
        let full_name = normalize_optional(request.full_name);
        let email = normalize_optional(request.email);

        if full_name.is_none() && email.is_none() {
            return Err(AuthError::Validation("no updates provided".to_string()));
        }
        if let Some(email) = email.as_deref() {
            if !valid_email(email) {
                return Err(AuthError::Validation("invalid email".to_string()));
            }
        }

        match self
            .store
            .update_profile(principal_id, full_name.as_deref(), email.as_deref())
            .await?
        {
            UpdateOutcome::Updated(credential) => Ok(Principal::from(credential)),
            UpdateOutcome::DuplicateIdentity => {
                Err(AuthError::Conflict("email already exists".to_string()))
            }
            UpdateOutcome::Missing => Err(AuthError::NotFound("no such user".to_string())),
        }
    }

    /// Replace the avatar with a newly uploaded asset.
    ///
    /// # Errors
    /// `Validation` when the reference is empty or the upload fails.
    pub async fn update_avatar(
        &self,
        principal_id: Uuid,
        reference: &str,
    ) -> Result<Principal, AuthError> {
        let url = self.upload_required(reference, "avatar").await?;
        self.store
            .set_avatar_url(principal_id, &url)
            .await?
            .map(Principal::from)
            .ok_or_else(|| AuthError::NotFound("no such user".to_string()))
    }

    /// Replace the cover image with a newly uploaded asset.
    ///
    /// # Errors
    /// `Validation` when the reference is empty or the upload fails.
    pub async fn update_cover_image(
        &self,
        principal_id: Uuid,
        reference: &str,
    ) -> Result<Principal, AuthError> {
        let url = self.upload_required(reference, "cover image").await?;
        self.store
            .set_cover_image_url(principal_id, &url)
            .await?
            .map(Principal::from)
            .ok_or_else(|| AuthError::NotFound("no such user".to_string()))
    }

    async fn upload_required(&self, reference: &str, label: &str) -> Result<String, AuthError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AuthError::Validation(format!("{label} is required")));
        }
        self.assets
            .upload(reference)
            .await?
            .ok_or_else(|| AuthError::Validation(format!("{label} could not be stored")))
    }

    fn mint_pair(&self, principal_id: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.tokens.mint_access(principal_id)?,
            refresh_token: self.tokens.mint_refresh(principal_id)?,
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
