//! Gate verification endpoint.

use crate::error::AppError;
use crate::metrics::{ADMISSIONS_TOTAL, record};
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use gatepass_core::AdmissionPass;
use gatepass_core::providers::{AssetStore, RateLimiter, RegistrantRepository};
use serde::Deserialize;

/// Scanned QR payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyEntryRequest {
    /// The signed credential read from the QR code.
    pub serial: String,
}

/// Verify a scanned credential and admit its holder.
///
/// # Endpoint
///
/// ```text
/// POST /api/verify-entry
/// { "serial": "<token>" }
/// ```
///
/// # Response
///
/// ```json
/// { "name": "A", "purpose": "Participant", "rollNumber": "R1", "entryCount": 1 }
/// ```
///
/// # Errors
///
/// - 400: missing serial
/// - 401: credential does not verify
/// - 403: entry limit reached
/// - 404: no registrant holds the credential
pub async fn verify_entry<R, S, L>(
    State(state): State<AppState<R, S, L>>,
    payload: Result<Json<VerifyEntryRequest>, JsonRejection>,
) -> Result<Json<AdmissionPass>, AppError>
where
    R: RegistrantRepository + 'static,
    S: AssetStore + 'static,
    L: RateLimiter + 'static,
{
    let Json(request) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let result = state.admission.verify_entry(&request.serial).await;
    record(ADMISSIONS_TOTAL, &result, "admitted");

    Ok(Json(result?))
}
