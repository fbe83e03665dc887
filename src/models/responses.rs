use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{AstroCompatibility, CompatibilityReport};
use crate::models::domain::{CompatibilityMatch, MatchInvitation, ReadingSnapshot, ShareSummary};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

/// Response for issuing a compatibility code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCodeResponse {
    pub code: String,
    /// False when the code only lives in this instance's local cache
    pub durable: bool,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Astrological comparison with its blended score alongside
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstroResponse {
    #[serde(flatten)]
    pub compatibility: AstroCompatibility,
    pub composite: u8,
}

impl From<AstroCompatibility> for AstroResponse {
    fn from(compatibility: AstroCompatibility) -> Self {
        let composite = compatibility.composite();
        Self {
            compatibility,
            composite,
        }
    }
}

/// Response for resolving a compatibility code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveCodeResponse {
    #[serde(rename = "readingSnapshot")]
    pub reading_snapshot: ReadingSnapshot,
    #[serde(rename = "issuerName")]
    pub issuer_name: String,
    pub uses: u32,
}

/// Response for the maintenance sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    #[serde(rename = "codesPurged")]
    pub codes_purged: u64,
    #[serde(rename = "invitationsExpired")]
    pub invitations_expired: u64,
}

/// Response for creating an invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitationResponse {
    #[serde(rename = "inviteCode")]
    pub invite_code: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationResponse {
    pub invitation: MatchInvitation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub compat_match: CompatibilityMatch,
}

/// Response for comparing against a compatibility code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareByCodeResponse {
    #[serde(rename = "match")]
    pub compat_match: CompatibilityMatch,
    pub report: CompatibilityReport,
}

/// Response for publishing a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    #[serde(rename = "match")]
    pub compat_match: CompatibilityMatch,
    pub summary: ShareSummary,
}

/// Public discovery feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub matches: Vec<ShareSummary>,
    pub total: usize,
}
