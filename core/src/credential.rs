//! Credential encoding and verification.
//!
//! Issuing a pass happens in two steps:
//!
//! 1. **Derivation**: the serial is hashed with bcrypt. The salted hash is the
//!    [`CredentialSecret`] stored on the registrant and used as its lookup key.
//!    The serial itself is discarded.
//! 2. **Signing**: the secret is wrapped in an HS256 JWT (claim `hashedSerial`)
//!    bound to the process-wide [`SigningKey`]. The JWT is the QR payload.
//!
//! Tokens carry no `exp` claim; a pass is valid for as long as the event runs.
//!
//! # Security
//!
//! - The signature stops clients from presenting a secret they did not receive.
//! - bcrypt makes enumerating the small serial space expensive.
//! - [`SigningKey`] and [`CredentialSecret`] redact themselves in `Debug` output.

use crate::error::{PassError, Result};
use crate::serial::Serial;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lowest bcrypt cost accepted.
pub const MIN_HASH_COST: u32 = 4;

/// Highest bcrypt cost accepted.
pub const MAX_HASH_COST: u32 = 31;

/// The one-way derived secret stored on a registrant.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialSecret(String);

impl CredentialSecret {
    /// Wrap a secret loaded from storage or recovered from a token.
    #[must_use]
    pub const fn from_stored(secret: String) -> Self {
        Self(secret)
    }

    /// The secret text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the secret text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialSecret(****)")
    }
}

/// HMAC key every credential is signed with.
///
/// Built once at startup and shared read-only.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Build a key from raw secret bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Internal`] if the secret is empty.
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        if secret.is_empty() {
            return Err(PassError::Internal("signing secret must not be empty".into()));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(****)")
    }
}

/// JWT claims of a pass credential.
#[derive(Debug, Serialize, Deserialize)]
struct PassClaims {
    /// The derived secret.
    #[serde(rename = "hashedSerial")]
    hashed_serial: String,
    /// Issued-at, seconds since the epoch.
    iat: i64,
}

/// Result of encoding a fresh serial.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// Secret to persist on the registrant.
    pub secret: CredentialSecret,
    /// Signed token to hand to the client.
    pub token: String,
}

/// Derives credential secrets and signs them.
#[derive(Debug, Clone)]
pub struct CredentialEncoder {
    key: Arc<SigningKey>,
    hash_cost: u32,
}

impl CredentialEncoder {
    /// Create an encoder.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Internal`] if `hash_cost` is outside
    /// [`MIN_HASH_COST`]..=[`MAX_HASH_COST`].
    pub fn new(key: Arc<SigningKey>, hash_cost: u32) -> Result<Self> {
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&hash_cost) {
            return Err(PassError::Internal(format!(
                "hash cost {hash_cost} outside {MIN_HASH_COST}..={MAX_HASH_COST}"
            )));
        }

        Ok(Self { key, hash_cost })
    }

    /// Derive the stored secret from a serial.
    ///
    /// CPU-bound; async callers should run it on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Internal`] if hashing fails (e.g. no random source).
    pub fn derive(&self, serial: &Serial) -> Result<CredentialSecret> {
        bcrypt::hash(serial.as_str(), self.hash_cost)
            .map(CredentialSecret)
            .map_err(|e| PassError::Internal(format!("credential derivation failed: {e}")))
    }

    /// Sign a derived secret into a token.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Internal`] if signing fails.
    pub fn sign(&self, secret: &CredentialSecret, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = PassClaims {
            hashed_serial: secret.0.clone(),
            iat: issued_at.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key.encoding)
            .map_err(|e| PassError::Internal(format!("credential signing failed: {e}")))
    }

    /// Derive and sign in one step.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::derive`] and [`Self::sign`].
    pub fn encode(&self, serial: &Serial, issued_at: DateTime<Utc>) -> Result<IssuedCredential> {
        let secret = self.derive(serial)?;
        let token = self.sign(&secret, issued_at)?;
        Ok(IssuedCredential { secret, token })
    }
}

/// Checks presented tokens and recovers their secret.
#[derive(Clone)]
pub struct CredentialVerifier {
    key: Arc<SigningKey>,
    validation: Validation,
}

impl CredentialVerifier {
    /// Create a verifier accepting HS256 tokens without expiry.
    #[must_use]
    pub fn new(key: Arc<SigningKey>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self { key, validation }
    }

    /// Verify a token and return the secret it carries.
    ///
    /// # Errors
    ///
    /// - Empty token → [`PassError::Validation`] on field `serial`
    /// - Bad signature, wrong algorithm, malformed token or claims →
    ///   [`PassError::InvalidCredential`]
    pub fn verify(&self, token: &str) -> Result<CredentialSecret> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PassError::invalid_field(
                "serial",
                "QR code serial number is required.",
            ));
        }

        let data = jsonwebtoken::decode::<PassClaims>(token, &self.key.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Credential rejected");
                PassError::InvalidCredential
            })?;

        if data.claims.hashed_serial.is_empty() {
            return Err(PassError::InvalidCredential);
        }

        Ok(CredentialSecret(data.claims.hashed_serial))
    }
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
