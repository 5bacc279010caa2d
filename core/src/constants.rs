//! Fixed values of the pass lifecycle.

use std::time::Duration;

/// Maximum number of admissions per registrant.
pub const ENTRY_CAP: u8 = 3;

/// Prefix of every generated serial.
pub const SERIAL_PREFIX: &str = "AUR";

/// Smallest numeric part of a serial.
pub const SERIAL_MIN: u16 = 1000;

/// Largest numeric part of a serial.
pub const SERIAL_MAX: u16 = 9999;

/// Default bcrypt cost for deriving credential secrets.
pub const DEFAULT_HASH_COST: u32 = 10;

/// Only addresses at this domain may register.
pub const INSTITUTION_EMAIL_DOMAIN: &str = "bitmesra.ac.in";

/// Upload attempts (including the first) before pass delivery gives up.
pub const UPLOAD_MAX_ATTEMPTS: usize = 5;

/// Fixed pause between upload attempts.
pub const UPLOAD_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Largest accepted pass document (10 MiB).
pub const MAX_PASS_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// MIME type of pass documents.
pub const PASS_DOCUMENT_MIME: &str = "application/pdf";
