//! In-process sliding window rate limiter.

use gatepass_core::providers::RateLimiter;
use gatepass_core::{PassError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Rate limit applied to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Attempts allowed per window.
    pub max_attempts: u32,
    /// Sliding window length.
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    /// 10 attempts per 15 minutes.
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// In-memory rate limiter using a sliding window per key.
///
/// State lives in this process only; run one instance per deployment or put
/// a shared limiter in front. Old timestamps are dropped on every check for
/// that key; [`InMemoryRateLimiter::purge`] drops idle keys.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateLimiter {
    /// Map of key -> attempt instants
    attempts: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl InMemoryRateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget keys with no attempt inside `window`.
    ///
    /// Returns the number of keys removed.
    pub fn purge(&self, window: Duration) -> usize {
        let Ok(mut attempts) = self.attempts.lock() else {
            return 0;
        };
        let now = Instant::now();
        let before = attempts.len();
        attempts.retain(|_, stamps| {
            stamps.retain(|&ts| now.duration_since(ts) < window);
            !stamps.is_empty()
        });
        before - attempts.len()
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.attempts.lock().map_or(0, |a| a.len())
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check_and_record(
        &self,
        key: &str,
        max_attempts: u32,
        window: Duration,
    ) -> impl Future<Output = Result<()>> + Send {
        let attempts = Arc::clone(&self.attempts);
        let key = key.to_string();

        async move {
            let mut attempts = attempts
                .lock()
                .map_err(|_| PassError::Internal("Mutex lock failed".into()))?;

            let now = Instant::now();
            let stamps = attempts.entry(key.clone()).or_default();

            // Remove old entries
            stamps.retain(|&ts| now.duration_since(ts) < window);

            if stamps.len() >= max_attempts as usize {
                let retry_after = stamps
                    .first()
                    .map_or(window, |&oldest| window.saturating_sub(now.duration_since(oldest)));

                tracing::warn!(
                    rate_limit_exceeded = true,
                    key = %key,
                    attempts = stamps.len() + 1,
                    max_attempts,
                    retry_after_secs = retry_after.as_secs(),
                    "Rate limit exceeded"
                );

                return Err(PassError::TooManyRequests { retry_after });
            }

            stamps.push(now);

            tracing::debug!(
                key = %key,
                attempts = stamps.len(),
                max_attempts,
                "Rate limit check passed"
            );

            Ok(())
        }
    }
}
