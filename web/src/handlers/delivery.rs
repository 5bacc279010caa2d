//! Pass document upload endpoint.

use crate::error::AppError;
use crate::metrics::{PASS_UPLOADS_TOTAL, record};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
};
use gatepass_core::PassDocument;
use gatepass_core::providers::{AssetStore, RateLimiter, RegistrantRepository};
use serde::Serialize;

/// Upload response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: &'static str,
}

fn multipart_error(err: &MultipartError) -> AppError {
    AppError::new(err.status(), err.body_text(), "BAD_REQUEST".to_string())
}

/// Collect the `pdf`, `email` and `rollNumber` parts; unknown parts are skipped.
async fn read_document(mut multipart: Multipart) -> Result<PassDocument, AppError> {
    let mut document = PassDocument::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        match field.name() {
            Some("pdf") => {
                document.pdf = field.bytes().await.map_err(|e| multipart_error(&e))?.to_vec();
            }
            Some("email") => {
                document.email = field.text().await.map_err(|e| multipart_error(&e))?;
            }
            Some("rollNumber") => {
                document.roll_number = field.text().await.map_err(|e| multipart_error(&e))?;
            }
            other => {
                tracing::debug!(field = ?other, "Skipping unexpected multipart field");
            }
        }
    }

    Ok(document)
}

/// Store the rendered pass PDF and link it to the registrant.
///
/// # Endpoint
///
/// ```text
/// POST /api/uploadPdf   (multipart/form-data: pdf, email, rollNumber)
/// ```
///
/// # Errors
///
/// - 400: no PDF part, or malformed multipart body
/// - 404: no registrant with that email
/// - 500: the asset store failed on every attempt
pub async fn upload_pdf<R, S, L>(
    State(state): State<AppState<R, S, L>>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError>
where
    R: RegistrantRepository + 'static,
    S: AssetStore + 'static,
    L: RateLimiter + 'static,
{
    let document = read_document(multipart).await?;
    tracing::info!(roll_number = %document.roll_number, bytes = document.pdf.len(), "Pass document received");

    let result = state.delivery.deliver(&document).await;
    record(PASS_UPLOADS_TOTAL, &result, "success");
    result?;

    Ok(Json(MessageResponse {
        message: "pass generated!",
    }))
}
