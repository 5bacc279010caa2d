//! In-memory provider implementations for tests.

pub mod asset_store;
pub mod repository;

pub use asset_store::ScriptedAssetStore;
pub use repository::InMemoryRegistrantRepository;

use chrono::{DateTime, TimeZone, Utc};
use gatepass_core::environment::Clock;

/// Fixed clock for deterministic tests
///
/// Always returns the same time, making tests reproducible.
///
/// # Example
///
/// ```
/// use gatepass_testing::mocks::FixedClock;
/// use gatepass_core::environment::Clock;
/// use chrono::Utc;
///
/// let clock = FixedClock::new(Utc::now());
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Create a default fixed clock for tests (2025-02-14 09:00:00 UTC).
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        Utc.with_ymd_and_hms(2025, 2, 14, 9, 0, 0)
            .single()
            .unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-02-14T09:00:00+00:00");
    }
}
