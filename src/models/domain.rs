use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::core::signs::{sign_for_date, Element, Modality, Sign};

/// Errors raised for malformed engine input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown prominence label: {0}")]
    UnknownProminence(String),

    #[error("Invalid field {field}: {message}")]
    InvalidField { field: String, message: String },
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "request".to_string());
        ValidationError::InvalidField {
            field,
            message: errors.to_string(),
        }
    }
}

/// A palm line as described by a reading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineEntry {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(rename = "personalizedInsight", alias = "insight", default)]
    pub personalized_insight: String,
}

/// How developed a palm mount is, ordered from flattest to fullest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Prominence {
    #[serde(rename = "slight")]
    Slight,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "well-developed")]
    Prominent,
}

impl Prominence {
    /// Ordinal level used for compatibility comparisons
    #[inline]
    pub fn level(self) -> u8 {
        match self {
            Prominence::Slight => 1,
            Prominence::Moderate => 2,
            Prominence::Prominent => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "slight" | "low" | "flat" | "underdeveloped" | "small" => Some(Prominence::Slight),
            "moderate" | "medium" | "average" | "balanced" => Some(Prominence::Moderate),
            "welldeveloped" | "prominent" | "high" | "strong" | "full" | "pronounced" => {
                Some(Prominence::Prominent)
            }
            _ => None,
        }
    }
}

impl TryFrom<String> for Prominence {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Prominence::from_label(&value).ok_or(ValidationError::UnknownProminence(value))
    }
}

/// A palm mount as described by a reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountEntry {
    pub prominence: Prominence,
    #[serde(default)]
    pub meaning: String,
}

/// Structured per-person reading produced by the text-generation service
///
/// Line and mount names are compared after normalisation, so `heart_line`,
/// `heartLine` and `Heart Line` address the same entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingDocument {
    pub lines: BTreeMap<String, LineEntry>,
    pub mounts: BTreeMap<String, MountEntry>,
}

impl ReadingDocument {
    pub fn line(&self, name: &str) -> Option<&LineEntry> {
        let wanted = normalize_feature_key(name);
        self.lines
            .iter()
            .find(|(key, _)| normalize_feature_key(key) == wanted)
            .map(|(_, entry)| entry)
    }

    pub fn mount(&self, name: &str) -> Option<&MountEntry> {
        let wanted = normalize_mount_key(name);
        self.mounts
            .iter()
            .find(|(key, _)| normalize_mount_key(key) == wanted)
            .map(|(_, entry)| entry)
    }

    /// Description text of a line, empty when the line is absent
    pub fn line_description(&self, name: &str) -> &str {
        self.line(name).map(|l| l.description.as_str()).unwrap_or("")
    }

    pub fn mount_prominence(&self, name: &str) -> Option<Prominence> {
        self.mount(name).map(|m| m.prominence)
    }
}

fn normalize_feature_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn normalize_mount_key(key: &str) -> String {
    let key = normalize_feature_key(key);
    let key = key.strip_prefix("mountof").unwrap_or(&key);
    let key = key.strip_prefix("mount").unwrap_or(key);
    key.strip_suffix("mount").unwrap_or(key).to_string()
}

/// Place of birth, all parts optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlaceOfBirth {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// Birth data of one person
///
/// The sign is never stored; it is always derived from `date_of_birth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BirthProfile {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: NaiveDate,
    #[serde(rename = "timeOfBirth", default)]
    pub time_of_birth: Option<NaiveTime>,
    #[serde(rename = "placeOfBirth", default)]
    #[validate(nested)]
    pub place_of_birth: Option<PlaceOfBirth>,
    #[serde(rename = "relationshipStatus", default)]
    pub relationship_status: Option<String>,
}

impl BirthProfile {
    pub fn sign(&self) -> Sign {
        sign_for_date(self.date_of_birth)
    }

    pub fn element(&self) -> Element {
        self.sign().element()
    }

    pub fn modality(&self) -> Modality {
        self.sign().modality()
    }
}

/// Explicit identity of a caller or party
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct PartyRef {
    #[serde(rename = "userId")]
    #[validate(length(min = 1))]
    pub user_id: String,
    #[serde(rename = "displayName")]
    #[validate(length(min = 1))]
    pub display_name: String,
}

impl PartyRef {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// What a compatibility code binds: one person's reading and birth data at issuance time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReadingSnapshot {
    #[serde(rename = "displayName")]
    #[validate(length(min = 1, max = 120))]
    pub display_name: String,
    pub reading: ReadingDocument,
    #[validate(nested)]
    pub profile: BirthProfile,
}

/// Persisted compatibility code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub code: String,
    pub issuer: PartyRef,
    pub snapshot: ReadingSnapshot,
    #[serde(rename = "issuedAt")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    pub active: bool,
    pub uses: u32,
}

impl CodeRecord {
    pub fn issuer_name(&self) -> &str {
        &self.issuer.display_name
    }

    /// Expiry is inclusive: a code whose `expires_at` equals `now` is expired
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[inline]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired(now)
    }
}

/// Kind of relationship a match is evaluated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Romantic,
    Friendship,
    Platonic,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Romantic => write!(f, "romantic"),
            MatchType::Friendship => write!(f, "friendship"),
            MatchType::Platonic => write!(f, "platonic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
}

/// Match invitation from one party to a not-yet-known second party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInvitation {
    pub id: Uuid,
    #[serde(rename = "inviteCode")]
    pub invite_code: String,
    #[serde(rename = "fromParty")]
    pub from_party: PartyRef,
    #[serde(rename = "toParty")]
    pub to_party: Option<PartyRef>,
    pub message: Option<String>,
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
    pub status: InvitationStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "acceptedAt")]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl MatchInvitation {
    /// Same inclusive boundary as compatibility codes
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Completed,
    Shared,
}

/// Persisted scores of a match, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScores {
    pub overall: u8,
    pub affinity: u8,
    pub communication: u8,
    #[serde(rename = "lifeDirection")]
    pub life_direction: u8,
    pub vitality: u8,
}

/// Narrative analysis of a match; stored and returned as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchAnalysis {
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub dynamics: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Scored outcome of comparing two parties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityMatch {
    pub id: Uuid,
    #[serde(rename = "partyA")]
    pub party_a: PartyRef,
    #[serde(rename = "partyB")]
    pub party_b: PartyRef,
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
    pub status: MatchStatus,
    pub scores: Option<MatchScores>,
    pub analysis: Option<MatchAnalysis>,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    #[serde(rename = "shareCount")]
    pub share_count: u32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl CompatibilityMatch {
    pub fn involves(&self, user_id: &str) -> bool {
        self.party_a.user_id == user_id || self.party_b.user_id == user_id
    }

    /// Public summary for the discovery feed; `None` until the match is scored
    pub fn share_summary(&self) -> Option<ShareSummary> {
        let scores = self.scores?;
        Some(ShareSummary {
            match_id: self.id,
            names: vec![
                self.party_a.display_name.clone(),
                self.party_b.display_name.clone(),
            ],
            overall_score: scores.overall,
            match_type: self.match_type,
            created_at: self.created_at,
        })
    }
}

/// Shareable summary of a published match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSummary {
    #[serde(rename = "matchId")]
    pub match_id: Uuid,
    pub names: Vec<String>,
    #[serde(rename = "overallScore")]
    pub overall_score: u8,
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Weights of the four palm sub-scores in the palm overall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub affinity: f64,
    pub communication: f64,
    pub life_direction: f64,
    pub vitality: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.affinity + self.communication + self.life_direction + self.vitality
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            affinity: 0.30,
            communication: 0.25,
            life_direction: 0.25,
            vitality: 0.20,
        }
    }
}

/// Blend of the two systems in the cross-system overall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationWeights {
    pub astrology: f64,
    pub palm: f64,
    pub bonus: f64,
    /// Sub-scores at or above this value count as strong
    pub strong_threshold: u8,
    /// Sub-scores below this value count as weak
    pub weak_threshold: u8,
}

impl CorrelationWeights {
    pub fn total(&self) -> f64 {
        self.astrology + self.palm + self.bonus
    }
}

impl Default for CorrelationWeights {
    fn default() -> Self {
        Self {
            astrology: 0.40,
            palm: 0.40,
            bonus: 0.20,
            strong_threshold: 75,
            weak_threshold: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_prominence_labels() {
        assert_eq!(Prominence::from_label("Well-developed"), Some(Prominence::Prominent));
        assert_eq!(Prominence::from_label("prominent"), Some(Prominence::Prominent));
        assert_eq!(Prominence::from_label(" Moderate "), Some(Prominence::Moderate));
        assert_eq!(Prominence::from_label("slight"), Some(Prominence::Slight));
        assert_eq!(Prominence::from_label("enormous"), None);
    }

    #[test]
    fn test_prominence_deserialize_rejects_unknown() {
        let ok: MountEntry =
            serde_json::from_str(r#"{"prominence": "Well-Developed", "meaning": "warmth"}"#).unwrap();
        assert_eq!(ok.prominence, Prominence::Prominent);

        let err = serde_json::from_str::<MountEntry>(r#"{"prominence": "huge"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_reading_key_normalisation() {
        let json = r#"{
            "lines": {"heart_line": {"description": "Deep and curved"}},
            "mounts": {"mountOfVenus": {"prominence": "moderate"}}
        }"#;
        let reading: ReadingDocument = serde_json::from_str(json).unwrap();

        assert_eq!(reading.line_description("heartLine"), "Deep and curved");
        assert_eq!(reading.line_description("Heart Line"), "Deep and curved");
        assert_eq!(reading.line_description("headLine"), "");
        assert_eq!(reading.mount_prominence("venus"), Some(Prominence::Moderate));
        assert_eq!(reading.mount_prominence("venus_mount"), Some(Prominence::Moderate));
        assert_eq!(reading.mount_prominence("mars"), None);
    }

    #[test]
    fn test_reading_requires_lines_and_mounts() {
        assert!(serde_json::from_str::<ReadingDocument>(r#"{"lines": {}}"#).is_err());
    }

    #[test]
    fn test_birth_profile_sign_is_derived() {
        let mut profile = BirthProfile {
            name: "Ana".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1992, 8, 1).unwrap(),
            time_of_birth: None,
            place_of_birth: None,
            relationship_status: None,
        };
        assert_eq!(profile.sign(), Sign::Leo);

        profile.date_of_birth = NaiveDate::from_ymd_opt(1992, 2, 1).unwrap();
        assert_eq!(profile.sign(), Sign::Aquarius);
        assert_eq!(profile.element(), Element::Air);
    }

    #[test]
    fn test_birth_profile_validation() {
        let profile = BirthProfile {
            name: String::new(),
            date_of_birth: NaiveDate::from_ymd_opt(1992, 8, 1).unwrap(),
            time_of_birth: None,
            place_of_birth: Some(PlaceOfBirth {
                latitude: Some(120.0),
                ..Default::default()
            }),
            relationship_status: None,
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_code_expiry_is_inclusive() {
        let now = Utc::now();
        let record = CodeRecord {
            code: "ABCD1234".to_string(),
            issuer: PartyRef::new("u1", "Ana"),
            snapshot: ReadingSnapshot {
                display_name: "Ana".to_string(),
                reading: ReadingDocument {
                    lines: BTreeMap::new(),
                    mounts: BTreeMap::new(),
                },
                profile: BirthProfile {
                    name: "Ana".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(1992, 8, 1).unwrap(),
                    time_of_birth: None,
                    place_of_birth: None,
                    relationship_status: None,
                },
            },
            issued_at: now - Duration::days(30),
            expires_at: now,
            active: true,
            uses: 0,
        };

        assert!(record.is_expired(now));
        assert!(!record.is_expired(now - Duration::seconds(1)));
        assert!(!record.is_usable(now));
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoringWeights::default().total() - 1.0).abs() < 1e-9);
        assert!((CorrelationWeights::default().total() - 1.0).abs() < 1e-9);
    }
}
