//! Registrant records and the views derived from them.

use crate::constants::ENTRY_CAP;
use crate::credential::CredentialSecret;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a registrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrantId(pub uuid::Uuid);

impl RegistrantId {
    /// Generate a new random `RegistrantId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RegistrantId {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Purpose
// ═══════════════════════════════════════════════════════════════════════

/// Why the registrant attends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    /// Event volunteer.
    Volunteer,
    /// Competition or session participant.
    Participant,
    /// General visitor.
    Visitor,
}

impl Purpose {
    /// Every accepted purpose, in display order.
    pub const ALL: [Self; 3] = [Self::Volunteer, Self::Participant, Self::Visitor];

    /// Get the purpose as stored and displayed.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Volunteer => "Volunteer",
            Self::Participant => "Participant",
            Self::Visitor => "Visitor",
        }
    }

    /// Parse a purpose, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns error if the purpose string is not recognized.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "volunteer" => Ok(Self::Volunteer),
            "participant" => Ok(Self::Participant),
            "visitor" => Ok(Self::Visitor),
            _ => Err(format!("Unknown purpose: {s}")),
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Entry Count
// ═══════════════════════════════════════════════════════════════════════

/// Number of admissions used, always within `0..=ENTRY_CAP`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct EntryCount(u8);

impl EntryCount {
    /// No admissions yet.
    pub const ZERO: Self = Self(0);

    /// Every admission used.
    pub const CAP: Self = Self(ENTRY_CAP);

    /// Raw count.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns `true` once no further admission is allowed.
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        self.0 >= ENTRY_CAP
    }

    /// The count after one more admission, or `None` at the cap.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        if self.is_exhausted() {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }
}

impl TryFrom<i64> for EntryCount {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= ENTRY_CAP)
            .map(Self)
            .ok_or_else(|| format!("entry count {value} outside 0..={ENTRY_CAP}"))
    }
}

impl From<EntryCount> for i64 {
    fn from(count: EntryCount) -> Self {
        Self::from(count.0)
    }
}

impl fmt::Display for EntryCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registrant
// ═══════════════════════════════════════════════════════════════════════

/// A registered attendee.
///
/// Created once at registration with [`EntryCount::ZERO`]; afterwards only the
/// entry count (by admission) and the asset reference (by pass delivery) change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registrant {
    /// Surrogate key.
    pub id: RegistrantId,
    /// Display name.
    pub name: String,
    /// Roll identifier (unique).
    pub roll_number: String,
    /// Institutional email, lowercased (unique).
    pub email: String,
    /// Attendance category.
    pub purpose: Purpose,
    /// Admissions used so far.
    pub entry_count: EntryCount,
    /// One-way derived credential secret (unique).
    pub credential_secret: CredentialSecret,
    /// Identifier of the uploaded pass document, once delivered.
    pub asset_ref: Option<String>,
    /// When the registrant signed up.
    pub created_at: DateTime<Utc>,
}

impl Registrant {
    /// Display fields shown to gate staff.
    #[must_use]
    pub fn admission_pass(&self) -> AdmissionPass {
        AdmissionPass {
            name: self.name.clone(),
            purpose: self.purpose,
            roll_number: self.roll_number.clone(),
            entry_count: self.entry_count,
        }
    }
}

/// What the scanner UI shows after a successful admission.
///
/// Never carries the credential secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionPass {
    /// Display name.
    pub name: String,
    /// Attendance category.
    pub purpose: Purpose,
    /// Roll identifier.
    pub roll_number: String,
    /// Count after this admission.
    pub entry_count: EntryCount,
}
