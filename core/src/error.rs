//! Error types for the pass lifecycle.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for pass operations.
pub type Result<T> = std::result::Result<T, PassError>;

/// A single failing input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as submitted by the client (e.g. `rollNumber`).
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Which unique attribute collided on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    /// Institutional email.
    Email,
    /// Roll identifier.
    RollNumber,
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::RollNumber => f.write_str("roll number"),
        }
    }
}

/// Error taxonomy for registration, credential handling and admission.
///
/// Every variant maps to a distinct caller-visible outcome; only
/// [`PassError::Database`] and [`PassError::Internal`] collapse to a generic
/// server error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PassError {
    // ═══════════════════════════════════════════════════════════
    // Client Errors
    // ═══════════════════════════════════════════════════════════

    /// One or more input fields are missing or malformed.
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Email or roll number is already registered.
    #[error("This {field} is already registered!")]
    DuplicateEntity {
        /// The colliding attribute
        field: DuplicateField,
    },

    /// Credential signature is missing, malformed, or does not verify.
    #[error("Invalid token!")]
    InvalidCredential,

    /// No registrant matches the presented credential.
    #[error("Invalid QR code!")]
    NotFound,

    /// The registrant has used every admission.
    #[error("Entry limit reached!")]
    LimitReached,

    /// Too many requests from one client.
    #[error("Too many requests, please retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: std::time::Duration,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The asset store kept failing after every retry.
    #[error("Upload failed after {attempts} attempts: {reason}")]
    UpstreamFailure {
        /// Attempts made, including the first
        attempts: usize,
        /// Last error reported by the asset store
        reason: String,
    },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Unexpected failure (should not be exposed to users).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PassError {
    /// Shorthand for a validation error on a single field.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Returns `true` if this error is caused by the caller's input or credential.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gatepass_core::PassError;
    /// assert!(PassError::LimitReached.is_client_error());
    /// assert!(!PassError::Internal("boom".into()).is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicateEntity { .. }
                | Self::InvalidCredential
                | Self::NotFound
                | Self::LimitReached
                | Self::TooManyRequests { .. }
        )
    }
}
