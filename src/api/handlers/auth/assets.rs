//! External object-store collaborator for image assets.
//!
//! Registration and the avatar/cover update flows hand a staged asset
//! reference to the store and persist the returned URL verbatim. A `None`
//! result means the asset could not be stored; the caller decides whether
//! that is fatal (required avatar) or not (optional cover image).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, error};
use url::Url;

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Resolve a staged asset reference to a durable URL.
    async fn upload(&self, reference: &str) -> Result<Option<String>>;
}

/// Uploads staged files to a remote object store over HTTP.
///
/// The endpoint is expected to accept a multipart `file` field and answer
/// with `{"url": "..."}`. The staged file is removed once the outcome is
/// known, success or not.
pub struct HttpAssetStore {
    endpoint: Url,
    client: Client,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpAssetStore {
    /// # Errors
    /// Returns an error if the endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).context("Invalid asset store URL")?;
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build asset store HTTP client")?;

        Ok(Self { endpoint, client })
    }

    async fn send(&self, reference: &str) -> Result<Option<String>> {
        let path = Path::new(reference);
        let Ok(bytes) = tokio::fs::read(path).await else {
            error!("Staged asset is unreadable: {reference}");
            return Ok(None);
        };

        let file_name = path
            .file_name()
            .map_or_else(|| "asset".to_string(), |name| name.to_string_lossy().to_string());
        let form =
            multipart::Form::new().part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let result = match self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                match response.json::<UploadResponse>().await {
                    Ok(body) => {
                        debug!("Asset stored at {}", body.url);
                        Some(body.url)
                    }
                    Err(e) => {
                        error!("Malformed asset store response: {e:?}");
                        None
                    }
                }
            }
            Ok(response) => {
                error!("Asset upload failed: {}", response.status());
                None
            }
            Err(e) => {
                error!("Error uploading asset: {e:?}");
                None
            }
        };

        // The staged file is consumed either way.
        let _ = tokio::fs::remove_file(path).await;

        Ok(result)
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, reference: &str) -> Result<Option<String>> {
        if reference.trim().is_empty() {
            return Ok(None);
        }
        self.send(reference).await
    }
}

/// Accepts staged references verbatim.
///
/// Used when no object store is configured, and in tests; the reference is
/// assumed to already be a hosted URL.
#[derive(Clone, Debug, Default)]
pub struct PassthroughAssetStore;

#[async_trait]
impl AssetStore for PassthroughAssetStore {
    async fn upload(&self, reference: &str) -> Result<Option<String>> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(trimmed.to_string()))
    }
}

/// A store whose uploads always fail; lets tests exercise the
/// required-asset failure branches.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub(crate) struct RejectingAssetStore;

#[cfg(test)]
#[async_trait]
impl AssetStore for RejectingAssetStore {
    async fn upload(&self, _reference: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
