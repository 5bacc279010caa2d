//! Google Drive asset store.
//!
//! Uploads pass documents with the Drive v3 multipart upload: one
//! `multipart/related` body carrying the JSON file metadata followed by the
//! PDF bytes. The file id from the response is the asset reference.
//! Requests carry a service-account access token; a 401 drops the cached
//! token so the next attempt mints a fresh one.

use crate::config::DriveConfig;
use crate::google_auth::{DRIVE_SCOPE, ServiceAccountTokenSource};
use gatepass_core::PassError;
use gatepass_core::providers::{Asset, AssetStore};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const BOUNDARY: &str = "gatepass-drive-upload";

/// File metadata part of the upload body.
#[derive(Debug, Serialize)]
struct FileMetadata<'a> {
    name: &'a str,
    parents: [&'a str; 1],
}

/// The subset of the Drive file resource we read back.
#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

/// [`AssetStore`] backed by a Google Drive folder.
#[derive(Clone)]
pub struct DriveAssetStore {
    client: Client,
    tokens: Arc<ServiceAccountTokenSource>,
    folder_id: String,
    upload_url: String,
}

impl std::fmt::Debug for DriveAssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveAssetStore")
            .field("tokens", &self.tokens)
            .field("folder_id", &self.folder_id)
            .field("upload_url", &self.upload_url)
            .finish_non_exhaustive()
    }
}

impl DriveAssetStore {
    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns `PassError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &DriveConfig) -> Result<Self, PassError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| PassError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let tokens = ServiceAccountTokenSource::new(
            client.clone(),
            config.service_account.clone(),
            DRIVE_SCOPE,
        );

        Ok(Self {
            client,
            tokens: Arc::new(tokens),
            folder_id: config.folder_id.clone(),
            upload_url: config.upload_url.clone(),
        })
    }

    /// Build the `multipart/related` body for one asset.
    fn related_body(&self, asset: &Asset) -> Result<Vec<u8>, PassError> {
        let metadata = serde_json::to_string(&FileMetadata {
            name: &asset.name,
            parents: [self.folder_id.as_str()],
        })
        .map_err(|e| PassError::Internal(format!("Failed to encode file metadata: {e}")))?;

        let mut body = Vec::with_capacity(asset.bytes.len() + metadata.len() + 256);
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Type: {}\r\n\r\n", asset.mime_type).as_bytes(),
        );
        body.extend_from_slice(&asset.bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Ok(body)
    }
}

fn upstream(reason: impl Into<String>) -> PassError {
    PassError::UpstreamFailure {
        attempts: 1,
        reason: reason.into(),
    }
}

impl AssetStore for DriveAssetStore {
    async fn upload(&self, asset: &Asset) -> Result<String, PassError> {
        let body = self.related_body(asset)?;
        let access_token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| upstream(format!("Drive request failed: {e}")))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let file = response
                    .json::<UploadedFile>()
                    .await
                    .map_err(|e| upstream(format!("Unreadable Drive response: {e}")))?;
                tracing::info!(file_id = %file.id, name = %asset.name, "Pass uploaded to Drive");
                Ok(file.id)
            }
            status => {
                if status == StatusCode::UNAUTHORIZED {
                    self.tokens.invalidate().await;
                }
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%status, body = %body, "Drive rejected upload");
                Err(upstream(format!("Drive returned {status}")))
            }
        }
    }
}
