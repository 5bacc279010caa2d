//! Human-readable serials.
//!
//! A serial is short and guessable on purpose: it is never stored or
//! transmitted in the clear. Only its salted one-way derivation (see
//! [`crate::credential`]) leaves the registration request.

use crate::constants::{SERIAL_MAX, SERIAL_MIN, SERIAL_PREFIX};
use rand::Rng;
use std::fmt;

/// A generated serial such as `AUR-4821`.
#[derive(Clone, PartialEq, Eq)]
pub struct Serial(String);

impl Serial {
    /// Generate a serial from the thread-local random source.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generate a serial from the given random source.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let number = rng.gen_range(SERIAL_MIN..=SERIAL_MAX);
        Self(format!("{SERIAL_PREFIX}-{number}"))
    }

    /// Returns `true` if `candidate` has the shape of a generated serial.
    ///
    /// # Examples
    ///
    /// ```
    /// use gatepass_core::Serial;
    ///
    /// assert!(Serial::is_well_formed("AUR-1000"));
    /// assert!(!Serial::is_well_formed("AUR-0999"));
    /// assert!(!Serial::is_well_formed("AUR-12345"));
    /// ```
    #[must_use]
    pub fn is_well_formed(candidate: &str) -> bool {
        let Some(digits) = candidate
            .strip_prefix(SERIAL_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
        else {
            return false;
        };

        digits.len() == 4
            && digits.bytes().all(|b| b.is_ascii_digit())
            && digits
                .parse::<u16>()
                .is_ok_and(|n| (SERIAL_MIN..=SERIAL_MAX).contains(&n))
    }

    /// The serial text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Serials are credential material; keep them out of logs.
impl fmt::Debug for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Serial(****)")
    }
}
