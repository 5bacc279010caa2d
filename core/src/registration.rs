//! Registration: intake validation and pass issuance.

use crate::credential::CredentialEncoder;
use crate::environment::Clock;
use crate::error::{PassError, Result};
use crate::providers::RegistrantRepository;
use crate::registrant::{EntryCount, Registrant, RegistrantId};
use crate::serial::Serial;
use crate::validation::validate_registration;
use serde::Deserialize;
use std::sync::Arc;

/// Raw registration form as submitted.
///
/// Missing fields deserialize as empty strings so they surface as field-level
/// validation errors instead of a generic parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationRequest {
    /// Display name.
    pub name: String,
    /// Roll identifier.
    pub roll_number: String,
    /// Institutional email.
    pub email: String,
    /// One of `Volunteer`, `Participant`, `Visitor`.
    pub purpose: String,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct IssuedPass {
    /// The new registrant.
    pub registrant_id: RegistrantId,
    /// Signed credential to render as a QR code.
    pub token: String,
}

/// Registers attendees and issues their credentials.
pub struct RegistrationService<R> {
    encoder: CredentialEncoder,
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for RegistrationService<R> {
    fn clone(&self) -> Self {
        Self {
            encoder: self.encoder.clone(),
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R: RegistrantRepository> RegistrationService<R> {
    /// Create a registration service.
    #[must_use]
    pub fn new(encoder: CredentialEncoder, repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoder,
            repository,
            clock,
        }
    }

    /// Register an attendee and return their signed credential.
    ///
    /// # Errors
    ///
    /// - Invalid fields → [`PassError::Validation`]
    /// - Email or roll number taken → [`PassError::DuplicateEntity`]
    /// - Credential derivation or persistence fails → [`PassError::Internal`] /
    ///   [`PassError::Database`]
    pub async fn register(&self, request: &RegistrationRequest) -> Result<IssuedPass> {
        let valid = validate_registration(
            &request.name,
            &request.roll_number,
            &request.email,
            &request.purpose,
        )?;

        if let Some(field) = self
            .repository
            .find_duplicate(&valid.email, &valid.roll_number)
            .await?
        {
            tracing::warn!(%field, roll_number = %valid.roll_number, "Duplicate registration rejected");
            return Err(PassError::DuplicateEntity { field });
        }

        let serial = Serial::generate();
        let issued_at = self.clock.now();
        let encoder = self.encoder.clone();
        let issued = tokio::task::spawn_blocking(move || encoder.encode(&serial, issued_at))
            .await
            .map_err(|e| PassError::Internal(format!("credential task failed: {e}")))??;

        let registrant = Registrant {
            id: RegistrantId::new(),
            name: valid.name,
            roll_number: valid.roll_number,
            email: valid.email,
            purpose: valid.purpose,
            entry_count: EntryCount::ZERO,
            credential_secret: issued.secret,
            asset_ref: None,
            created_at: issued_at,
        };

        self.repository.insert(&registrant).await?;

        tracing::info!(
            registrant_id = %registrant.id.0,
            roll_number = %registrant.roll_number,
            purpose = %registrant.purpose,
            "Registrant created"
        );

        Ok(IssuedPass {
            registrant_id: registrant.id,
            token: issued.token,
        })
    }
}
