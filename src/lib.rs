//! Compat Engine - compatibility matching service
//!
//! Turns two people's palm readings and birth data into a compatibility verdict,
//! brokers short codes so strangers can compare without exchanging identities,
//! and tracks the resulting invitations and matches.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{sign_for_date, CompatibilityReport, Matcher, Sign};
pub use crate::models::{BirthProfile, CompatibilityMatch, ReadingDocument, ReadingSnapshot, ScoringWeights};
pub use crate::services::{CodeBroker, Lifecycle};
