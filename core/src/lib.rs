//! # Gatepass Core
//!
//! Credential lifecycle for event entry passes.
//!
//! A registrant receives a signed credential (rendered as a QR code) and gate
//! staff scan it to admit them a bounded number of times. This crate holds the
//! pure domain logic and the traits behind which all I/O sits.
//!
//! ## Lifecycle
//!
//! ```text
//! registration:  Serial ──bcrypt──▶ CredentialSecret ──HS256──▶ token (QR payload)
//!                                         │
//!                                         └──▶ stored on the Registrant (unique, indexed)
//!
//! gate scan:     token ──verify──▶ CredentialSecret ──admit(cap = 3)──▶ AdmissionPass
//! ```
//!
//! ## Components
//!
//! - [`serial`]: human-readable random serials (`AUR-NNNN`)
//! - [`credential`]: one-way derivation, signing and verification
//! - [`admission`]: entry-count admission control
//! - [`registration`]: intake validation and pass issuance
//! - [`delivery`]: pass document upload with retry
//! - [`providers`]: repository, asset store and rate limiter seams
//!
//! ## Example
//!
//! ```ignore
//! use gatepass_core::credential::{CredentialEncoder, CredentialVerifier, SigningKey};
//! use gatepass_core::serial::Serial;
//! use std::sync::Arc;
//!
//! let key = Arc::new(SigningKey::from_secret(b"server-secret")?);
//! let encoder = CredentialEncoder::new(Arc::clone(&key), 10)?;
//! let verifier = CredentialVerifier::new(key);
//!
//! let issued = encoder.encode(&Serial::generate(), issued_at)?;
//! let secret = verifier.verify(&issued.token)?;
//! assert_eq!(secret, issued.secret);
//! ```

pub mod admission;
pub mod constants;
pub mod credential;
pub mod delivery;
pub mod error;
pub mod providers;
pub mod registrant;
pub mod registration;
pub mod retry;
pub mod serial;
pub mod validation;

// Re-export commonly used types
pub use admission::AdmissionController;
pub use credential::{CredentialEncoder, CredentialSecret, CredentialVerifier, IssuedCredential, SigningKey};
pub use delivery::{PassDelivery, PassDocument};
pub use error::{DuplicateField, FieldError, PassError, Result};
pub use registrant::{AdmissionPass, EntryCount, Purpose, Registrant, RegistrantId};
pub use registration::{IssuedPass, RegistrationRequest, RegistrationService};
pub use serial::Serial;

/// Environment module - Injected dependencies that are not persistence
///
/// Everything time-dependent goes through [`environment::Clock`] so tests can
/// pin timestamps.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
