//! Gate admission.
//!
//! A scan is admitted when its token verifies, a registrant holds the
//! recovered secret, and that registrant still has entries left. The
//! check-and-increment is delegated to [`RegistrantRepository::admit`], which
//! performs it atomically, so two near-simultaneous scans of the same QR code
//! can never both consume the last entry.

use crate::credential::{CredentialSecret, CredentialVerifier};
use crate::error::{PassError, Result};
use crate::providers::RegistrantRepository;
use crate::registrant::{AdmissionPass, EntryCount};
use std::sync::Arc;

/// Admits scanned credentials against the entry cap.
#[derive(Debug)]
pub struct AdmissionController<R> {
    verifier: CredentialVerifier,
    repository: Arc<R>,
    cap: EntryCount,
}

impl<R> Clone for AdmissionController<R> {
    fn clone(&self) -> Self {
        Self {
            verifier: self.verifier.clone(),
            repository: Arc::clone(&self.repository),
            cap: self.cap,
        }
    }
}

impl<R: RegistrantRepository> AdmissionController<R> {
    /// Create a controller enforcing [`EntryCount::CAP`].
    #[must_use]
    pub const fn new(verifier: CredentialVerifier, repository: Arc<R>) -> Self {
        Self {
            verifier,
            repository,
            cap: EntryCount::CAP,
        }
    }

    /// Verify a scanned token and admit its holder.
    ///
    /// # Errors
    ///
    /// - Empty token → [`PassError::Validation`]
    /// - Signature check fails → [`PassError::InvalidCredential`] (no record touched)
    /// - No registrant holds the secret → [`PassError::NotFound`]
    /// - Entry cap reached → [`PassError::LimitReached`] (count unchanged)
    pub async fn verify_entry(&self, token: &str) -> Result<AdmissionPass> {
        let secret = self.verifier.verify(token)?;
        self.admit(&secret).await
    }

    /// Admit the holder of an already verified secret.
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify_entry`] minus the credential errors.
    pub async fn admit(&self, secret: &CredentialSecret) -> Result<AdmissionPass> {
        match self.repository.admit(secret, self.cap).await {
            Ok(registrant) => {
                tracing::info!(
                    registrant_id = %registrant.id.0,
                    roll_number = %registrant.roll_number,
                    entry_count = registrant.entry_count.get(),
                    "Entry admitted"
                );
                Ok(registrant.admission_pass())
            }
            Err(PassError::LimitReached) => {
                tracing::warn!(cap = self.cap.get(), "Entry refused: limit reached");
                Err(PassError::LimitReached)
            }
            Err(PassError::NotFound) => {
                tracing::warn!("Entry refused: no registrant holds this credential");
                Err(PassError::NotFound)
            }
            Err(err) => Err(err),
        }
    }
}
