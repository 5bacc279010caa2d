//! # Gatepass Testing
//!
//! Testing utilities and helpers for gatepass.
//!
//! This crate provides:
//! - In-memory implementations of the provider traits
//! - A fixed clock for deterministic timestamps
//! - Fixtures for registrations and credential services
//!
//! ## Example
//!
//! ```ignore
//! use gatepass_testing::{fixtures, mocks::InMemoryRegistrantRepository};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn admits_three_times() {
//!     let repo = Arc::new(InMemoryRegistrantRepository::new());
//!     let services = fixtures::services(Arc::clone(&repo))?;
//!
//!     let pass = services.registration.register(&fixtures::registration("A", "R1")).await?;
//!     for expected in 1..=3 {
//!         let admitted = services.admission.verify_entry(&pass.token).await?;
//!         assert_eq!(admitted.entry_count.get(), expected);
//!     }
//! }
//! ```

pub mod mocks;

// Re-export commonly used items
pub use mocks::{FixedClock, InMemoryRegistrantRepository, ScriptedAssetStore, test_clock};

/// Fixtures for common test scenarios.
pub mod fixtures {
    use crate::mocks::test_clock;
    use gatepass_core::credential::MIN_HASH_COST;
    use gatepass_core::providers::RegistrantRepository;
    use gatepass_core::{
        AdmissionController, CredentialEncoder, CredentialVerifier, RegistrationRequest,
        RegistrationService, Result, SigningKey,
    };
    use std::sync::Arc;

    /// Signing secret used by every fixture.
    pub const TEST_SIGNING_SECRET: &str = "gatepass-test-signing-secret";

    /// Signing key built from [`TEST_SIGNING_SECRET`].
    ///
    /// # Errors
    ///
    /// Never fails for the constant secret; the `Result` mirrors [`SigningKey::from_secret`].
    pub fn signing_key() -> Result<Arc<SigningKey>> {
        SigningKey::from_secret(TEST_SIGNING_SECRET.as_bytes()).map(Arc::new)
    }

    /// A valid registration form for `name` / `roll_number`.
    ///
    /// The email is derived from the roll number so fixtures never collide
    /// unless asked to.
    #[must_use]
    pub fn registration(name: &str, roll_number: &str) -> RegistrationRequest {
        RegistrationRequest {
            name: name.to_string(),
            roll_number: roll_number.to_string(),
            email: format!("{}@bitmesra.ac.in", roll_number.to_lowercase()),
            purpose: "Participant".to_string(),
        }
    }

    /// Registration and admission services sharing one repository and key.
    pub struct Services<R> {
        /// Issues credentials.
        pub registration: RegistrationService<R>,
        /// Admits scanned credentials.
        pub admission: AdmissionController<R>,
        /// Encoder with the shared key (for crafting tokens in tests).
        pub encoder: CredentialEncoder,
    }

    /// Build services over `repository` with the cheapest bcrypt cost.
    ///
    /// # Errors
    ///
    /// Returns error only if the fixture key or cost were rejected.
    pub fn services<R: RegistrantRepository>(repository: Arc<R>) -> Result<Services<R>> {
        let key = signing_key()?;
        let encoder = CredentialEncoder::new(Arc::clone(&key), MIN_HASH_COST)?;

        Ok(Services {
            registration: RegistrationService::new(
                encoder.clone(),
                Arc::clone(&repository),
                Arc::new(test_clock()),
            ),
            admission: AdmissionController::new(CredentialVerifier::new(key), repository),
            encoder,
        })
    }
}

/// Install a compact tracing subscriber for test output.
///
/// Safe to call from many tests; only the first call installs it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatepass_core=debug,gatepass_web=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
