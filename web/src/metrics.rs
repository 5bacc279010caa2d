//! Business metrics for the pass service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `gatepass_registrations_total{outcome}` - Registration attempts by outcome
//! - `gatepass_admissions_total{outcome}` - Gate scans by outcome
//! - `gatepass_pass_uploads_total{outcome}` - Pass document uploads by outcome

use gatepass_core::PassError;
use metrics::describe_counter;

/// Registration attempts.
pub const REGISTRATIONS_TOTAL: &str = "gatepass_registrations_total";
/// Gate scans.
pub const ADMISSIONS_TOTAL: &str = "gatepass_admissions_total";
/// Pass document uploads.
pub const PASS_UPLOADS_TOTAL: &str = "gatepass_pass_uploads_total";

/// Register all metric descriptions.
///
/// Call once at startup, after installing a recorder.
pub fn register_metrics() {
    describe_counter!(
        REGISTRATIONS_TOTAL,
        "Registration attempts by outcome (success, invalid, duplicate, rate_limited, error)"
    );
    describe_counter!(
        ADMISSIONS_TOTAL,
        "Gate scans by outcome (admitted, invalid_credential, not_found, limit_reached, error)"
    );
    describe_counter!(
        PASS_UPLOADS_TOTAL,
        "Pass document uploads by outcome (success, invalid, not_found, upstream_failure, error)"
    );

    tracing::info!("Business metrics registered");
}

/// Stable label for an operation outcome.
#[must_use]
pub fn outcome_label<T>(result: &Result<T, PassError>, success: &'static str) -> &'static str {
    match result {
        Ok(_) => success,
        Err(PassError::Validation(_)) => "invalid",
        Err(PassError::DuplicateEntity { .. }) => "duplicate",
        Err(PassError::InvalidCredential) => "invalid_credential",
        Err(PassError::NotFound) => "not_found",
        Err(PassError::LimitReached) => "limit_reached",
        Err(PassError::TooManyRequests { .. }) => "rate_limited",
        Err(PassError::UpstreamFailure { .. }) => "upstream_failure",
        Err(PassError::Database(_) | PassError::Internal(_)) => "error",
    }
}

/// Count one outcome of `metric`.
pub fn record<T>(metric: &'static str, result: &Result<T, PassError>, success: &'static str) {
    metrics::counter!(metric, "outcome" => outcome_label(result, success)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(&Ok::<(), _>(()), "admitted"), "admitted");
        assert_eq!(
            outcome_label(&Err::<(), _>(PassError::LimitReached), "admitted"),
            "limit_reached"
        );
        assert_eq!(
            outcome_label(&Err::<(), _>(PassError::Internal("x".into())), "admitted"),
            "error"
        );
    }
}
