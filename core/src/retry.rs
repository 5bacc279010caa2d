//! Fixed-delay retry for flaky upstream calls.
//!
//! # Example
//!
//! ```rust
//! use gatepass_core::retry::{RetryPolicy, retry_with_fixed_delay};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(5)
//!     .delay(Duration::from_secs(1))
//!     .build();
//!
//! let outcome = retry_with_fixed_delay(&policy, || async {
//!     Ok::<_, String>(42)
//! })
//! .await;
//!
//! assert_eq!(outcome.map_err(|e| e.last_error), Ok(42));
//! # Ok(())
//! # }
//! ```

use crate::constants::{UPLOAD_MAX_ATTEMPTS, UPLOAD_RETRY_DELAY};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy: a fixed number of attempts with a fixed pause between them.
///
/// # Default Values
///
/// - `max_attempts`: 5 (including the first)
/// - `delay`: 1 second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never zero.
    pub max_attempts: usize,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: UPLOAD_MAX_ATTEMPTS,
            delay: UPLOAD_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_attempts: None,
            delay: None,
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<usize>,
    delay: Option<Duration>,
}

impl RetryPolicyBuilder {
    /// Set total attempts (clamped to at least 1).
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set pause between attempts.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(UPLOAD_MAX_ATTEMPTS).max(1),
            delay: self.delay.unwrap_or(UPLOAD_RETRY_DELAY),
        }
    }
}

/// Every attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// Attempts made.
    pub attempts: usize,
    /// Error from the final attempt.
    pub last_error: E,
}

/// Retry an async operation with a fixed delay between attempts.
///
/// # Returns
///
/// `Ok(T)` from the first successful attempt, or [`RetryExhausted`] carrying
/// the final error once `policy.max_attempts` attempts have failed.
///
/// # Errors
///
/// Returns [`RetryExhausted`] when no attempt succeeds.
pub async fn retry_with_fixed_delay<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) if attempt >= max_attempts => {
                tracing::error!(
                    attempt,
                    error = %err,
                    "Operation failed after max attempts"
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }
            Err(err) => {
                tracing::warn!(
                    attempt,
                    delay_ms = policy.delay.as_millis(),
                    error = %err,
                    "Operation failed, retrying..."
                );
                sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(max_attempts)
            .delay(Duration::from_millis(1))
            .build()
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(RetryPolicy::builder().build(), policy);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::builder().max_attempts(0).build().max_attempts, 1);
    }

    #[tokio::test]
    async fn test_succeeds_on_first_try() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let result = retry_with_fixed_delay(&fast_policy(5), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let result = retry_with_fixed_delay(&fast_policy(5), || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst);
                if attempt < 3 {
                    Err(format!("Attempt {attempt} failed"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let result = retry_with_fixed_delay(&fast_policy(5), || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(format!("failure {attempt}"))
            }
        })
        .await;

        assert_eq!(
            result,
            Err(RetryExhausted {
                attempts: 5,
                last_error: "failure 4".to_string(),
            })
        );
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_fixed_delay_between_attempts() {
        let policy = RetryPolicy::builder()
            .max_attempts(3)
            .delay(Duration::from_secs(1))
            .build();
        let started = tokio::time::Instant::now();

        let result = retry_with_fixed_delay(&policy, || async { Err::<(), _>("down") }).await;

        assert!(result.is_err());
        // Two pauses between three attempts.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
