//! Provider traits for everything the pass lifecycle does not compute itself.
//!
//! Services in this crate are generic over these traits; production
//! implementations live in `gatepass-postgres`, `gatepass-web` and
//! `gatepass-server`, in-memory ones in `gatepass-testing`.

use crate::credential::CredentialSecret;
use crate::error::{DuplicateField, Result};
use crate::registrant::{EntryCount, Registrant};
use std::future::Future;
use std::time::Duration;

/// Registrant repository.
///
/// # Concurrency
///
/// [`RegistrantRepository::admit`] MUST be atomic with respect to concurrent
/// calls for the same secret: at most `cap` calls ever succeed for a record.
pub trait RegistrantRepository: Send + Sync {
    /// Persist a new registrant.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Email or roll number already exists → `PassError::DuplicateEntity`
    /// - Database operation fails → `PassError::Database`
    fn insert(&self, registrant: &Registrant) -> impl Future<Output = Result<()>> + Send;

    /// Report which unique attribute, if any, is already taken.
    ///
    /// Email is checked before roll number.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails.
    fn find_duplicate(
        &self,
        email: &str,
        roll_number: &str,
    ) -> impl Future<Output = Result<Option<DuplicateField>>> + Send;

    /// Get registrant by email.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails.
    fn find_by_email(&self, email: &str) -> impl Future<Output = Result<Option<Registrant>>> + Send;

    /// Increment the entry count of the registrant holding `secret`, if it is
    /// below `cap`, and return the updated record.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No registrant holds the secret → `PassError::NotFound`
    /// - Entry count is already at `cap` → `PassError::LimitReached` (record unchanged)
    /// - Database operation fails → `PassError::Database`
    fn admit(
        &self,
        secret: &CredentialSecret,
        cap: EntryCount,
    ) -> impl Future<Output = Result<Registrant>> + Send;

    /// Record the uploaded pass document on the registrant with `email`.
    ///
    /// A later upload replaces an earlier reference.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No registrant has the email → `PassError::NotFound`
    /// - Database operation fails → `PassError::Database`
    fn attach_asset(&self, email: &str, asset_ref: &str) -> impl Future<Output = Result<()>> + Send;
}

/// A named binary object handed to the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// File name in the store.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Raw content.
    pub bytes: Vec<u8>,
}

/// External object storage for rendered pass documents.
pub trait AssetStore: Send + Sync {
    /// Upload an asset and return its identifier in the store.
    ///
    /// A single attempt; retrying is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `PassError::UpstreamFailure` (or any other error) if the upload fails.
    fn upload(&self, asset: &Asset) -> impl Future<Output = Result<String>> + Send;
}

/// Rate limiter for abuse-prone endpoints.
///
/// Implements sliding window rate limiting keyed by an arbitrary string
/// (typically the client IP).
pub trait RateLimiter: Send + Sync {
    /// Check and record in one atomic operation.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Request allowed and recorded
    /// * `Err(PassError::TooManyRequests)` - Rate limit exceeded
    ///
    /// # Errors
    ///
    /// Returns error if the limit is exceeded or the backing store fails.
    fn check_and_record(
        &self,
        key: &str,
        max_attempts: u32,
        window: Duration,
    ) -> impl Future<Output = Result<()>> + Send;
}
