//! Registration endpoint.

use crate::error::AppError;
use crate::extractors::{ClientIp, RequestId};
use crate::metrics::{REGISTRATIONS_TOTAL, record};
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use gatepass_core::providers::{AssetStore, RateLimiter, RegistrantRepository};
use gatepass_core::{PassError, RegistrationRequest};
use serde::Serialize;

/// Registration response body.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Signed credential to render as the QR code.
    pub serial: String,
}

/// Register an attendee and return their signed credential.
///
/// # Endpoint
///
/// ```text
/// POST /api/register
/// { "name": "...", "rollNumber": "...", "email": "...@bitmesra.ac.in", "purpose": "Participant" }
/// ```
///
/// # Errors
///
/// - 400: invalid fields or duplicate email / roll number
/// - 429: too many registrations from this client
/// - 500: anything unexpected
#[tracing::instrument(skip_all, fields(client_ip = %client_ip.0, request_id = %request_id.0))]
pub async fn register<R, S, L>(
    State(state): State<AppState<R, S, L>>,
    client_ip: ClientIp,
    request_id: RequestId,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError>
where
    R: RegistrantRepository + 'static,
    S: AssetStore + 'static,
    L: RateLimiter + 'static,
{
    let limit = state.registration_limit;
    if let Err(err) = state
        .rate_limiter
        .check_and_record(&client_ip.0.to_string(), limit.max_attempts, limit.window)
        .await
    {
        metrics::counter!(REGISTRATIONS_TOTAL, "outcome" => "rate_limited").increment(1);
        return Err(err.into());
    }

    let Json(request) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let result = state.registration.register(&request).await;
    record(REGISTRATIONS_TOTAL, &result, "success");

    let issued = result.map_err(|err| {
        if let PassError::DuplicateEntity { field } = &err {
            tracing::info!(%field, "Registration rejected as duplicate");
        }
        AppError::from(err)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            serial: issued.token,
        }),
    ))
}
