//! Application state for Axum handlers.

use crate::rate_limit::RateLimitPolicy;
use gatepass_core::{AdmissionController, PassDelivery, RegistrationService};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Generic over the registrant repository `R`, the asset store `S` and the
/// rate limiter `L`, so tests run the real handlers over in-memory providers.
pub struct AppState<R, S, L> {
    /// Registration intake.
    pub registration: RegistrationService<R>,
    /// Gate admission.
    pub admission: AdmissionController<R>,
    /// Pass document upload.
    pub delivery: PassDelivery<R, S>,
    /// Per-client limiter for registration.
    pub rate_limiter: Arc<L>,
    /// Limit applied to registration.
    pub registration_limit: RateLimitPolicy,
}

impl<R, S, L> AppState<R, S, L> {
    /// Assemble the state.
    #[must_use]
    pub const fn new(
        registration: RegistrationService<R>,
        admission: AdmissionController<R>,
        delivery: PassDelivery<R, S>,
        rate_limiter: Arc<L>,
        registration_limit: RateLimitPolicy,
    ) -> Self {
        Self {
            registration,
            admission,
            delivery,
            rate_limiter,
            registration_limit,
        }
    }
}

impl<R, S, L> Clone for AppState<R, S, L> {
    fn clone(&self) -> Self {
        Self {
            registration: self.registration.clone(),
            admission: self.admission.clone(),
            delivery: self.delivery.clone(),
            rate_limiter: Arc::clone(&self.rate_limiter),
            registration_limit: self.registration_limit,
        }
    }
}
