//! Google service-account access tokens.
//!
//! A service account signs an RS256 JWT-bearer assertion with its private
//! key and exchanges it at the account's `token_uri` for a short-lived access
//! token. Tokens are cached and refreshed shortly before they expire.

use base64::Engine;
use gatepass_core::PassError;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// OAuth scope for full Drive access.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Token endpoint used when the key file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each assertion (the maximum Google accepts).
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Tokens this close to expiry are refreshed instead of reused.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file we use.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account identity (`…@….iam.gserviceaccount.com`).
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// OAuth token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a key file given as base64-encoded JSON.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the value is not base64 or
    /// not a service-account key.
    pub fn from_base64(encoded: &str) -> Result<Self, String> {
        let json = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| format!("not base64: {e}"))?;
        serde_json::from_slice(&json).map_err(|e| format!("not a service account key: {e}"))
    }
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Claims of the JWT-bearer assertion.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub(crate) iss: String,
    pub(crate) scope: String,
    pub(crate) aud: String,
    pub(crate) iat: u64,
    pub(crate) exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

fn token_failure(reason: impl Into<String>) -> PassError {
    PassError::UpstreamFailure {
        attempts: 1,
        reason: reason.into(),
    }
}

/// Mints and caches access tokens for one service account and scope.
pub struct ServiceAccountTokenSource {
    client: Client,
    key: ServiceAccountKey,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccountTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenSource")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokenSource {
    /// Create a token source sharing `client`.
    #[must_use]
    pub fn new(client: Client, key: ServiceAccountKey, scope: impl Into<String>) -> Self {
        Self {
            client,
            key,
            scope: scope.into(),
            cached: Mutex::new(None),
        }
    }

    /// Sign an assertion issued at `now` (seconds since the epoch).
    pub(crate) fn assertion(&self, now: u64) -> Result<String, PassError> {
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| PassError::Internal(format!("Unusable service account key: {e}")))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| PassError::Internal(format!("Failed to sign assertion: {e}")))
    }

    /// A valid access token, minting a new one when the cached token is
    /// missing or about to expire.
    ///
    /// # Errors
    ///
    /// Returns `PassError::UpstreamFailure` if the token endpoint fails, or
    /// `PassError::Internal` if the assertion cannot be signed.
    pub async fn access_token(&self) -> Result<String, PassError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.value.clone());
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| PassError::Internal(format!("System clock before epoch: {e}")))?
            .as_secs();
        let assertion = self.assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| token_failure(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "Token endpoint rejected assertion");
            return Err(token_failure(format!("Token endpoint returned {status}")));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| token_failure(format!("Unreadable token response: {e}")))?;
        tracing::debug!(expires_in = token.expires_in, "Minted Drive access token");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(token.access_token)
    }

    /// Drop the cached token so the next call mints a fresh one.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}
