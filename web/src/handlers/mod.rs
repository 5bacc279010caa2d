//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod admission;
pub mod delivery;
pub mod health;
pub mod registration;

// Re-export common handler utilities
pub use admission::verify_entry;
pub use delivery::upload_pdf;
pub use health::health_check;
pub use registration::register;
