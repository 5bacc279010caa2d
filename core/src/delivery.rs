//! Pass document delivery.
//!
//! The client renders the QR credential into a PDF and posts it back; the
//! document is pushed to the asset store and its identifier recorded on the
//! registrant. Upload failures are retried on a fixed schedule. Running out of
//! attempts leaves the registration itself intact.

use crate::constants::{MAX_PASS_DOCUMENT_BYTES, PASS_DOCUMENT_MIME};
use crate::error::{PassError, Result};
use crate::providers::{Asset, AssetStore, RegistrantRepository};
use crate::retry::{RetryPolicy, retry_with_fixed_delay};
use std::sync::Arc;

/// A rendered pass submitted for storage.
#[derive(Debug, Clone, Default)]
pub struct PassDocument {
    /// Email the registrant signed up with.
    pub email: String,
    /// Roll number, used to name the stored file.
    pub roll_number: String,
    /// PDF content.
    pub pdf: Vec<u8>,
}

impl PassDocument {
    /// Name under which the document is stored.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("aurora25-{}-pass.pdf", self.roll_number.trim())
    }
}

/// Uploads pass documents and links them to registrants.
pub struct PassDelivery<R, S> {
    repository: Arc<R>,
    store: Arc<S>,
    policy: RetryPolicy,
}

impl<R, S> Clone for PassDelivery<R, S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<R, S> PassDelivery<R, S>
where
    R: RegistrantRepository,
    S: AssetStore,
{
    /// Create a delivery service.
    #[must_use]
    pub const fn new(repository: Arc<R>, store: Arc<S>, policy: RetryPolicy) -> Self {
        Self {
            repository,
            store,
            policy,
        }
    }

    /// Store the document and record its asset reference.
    ///
    /// # Errors
    ///
    /// - Empty or oversized document → [`PassError::Validation`]
    /// - Unknown email → [`PassError::NotFound`]
    /// - Every upload attempt fails → [`PassError::UpstreamFailure`]
    pub async fn deliver(&self, document: &PassDocument) -> Result<String> {
        if document.pdf.is_empty() {
            return Err(PassError::invalid_field("pdf", "No PDF file uploaded."));
        }
        if document.pdf.len() > MAX_PASS_DOCUMENT_BYTES {
            return Err(PassError::invalid_field("pdf", "PDF exceeds the 10 MB limit."));
        }

        let email = document.email.trim().to_lowercase();
        let registrant = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or(PassError::NotFound)?;

        let asset = Asset {
            name: document.file_name(),
            mime_type: PASS_DOCUMENT_MIME.to_string(),
            bytes: document.pdf.clone(),
        };

        let asset_ref = retry_with_fixed_delay(&self.policy, || self.store.upload(&asset))
            .await
            .map_err(|exhausted| PassError::UpstreamFailure {
                attempts: exhausted.attempts,
                reason: exhausted.last_error.to_string(),
            })?;

        self.repository.attach_asset(&registrant.email, &asset_ref).await?;

        tracing::info!(
            registrant_id = %registrant.id.0,
            asset_ref = %asset_ref,
            "Pass document stored"
        );

        Ok(asset_ref)
    }
}
