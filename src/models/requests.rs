use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{
    BirthProfile, MatchAnalysis, MatchScores, MatchType, PartyRef, ReadingDocument, ReadingSnapshot,
};

/// Request to issue a compatibility code for the caller's reading
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IssueCodeRequest {
    #[serde(rename = "readingSnapshot")]
    #[validate(nested)]
    pub reading_snapshot: ReadingSnapshot,
}

/// Request to score two readings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub reading1: ReadingDocument,
    pub reading2: ReadingDocument,
}

/// Request to compare two birth profiles
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AstroRequest {
    #[validate(nested)]
    pub profile1: BirthProfile,
    #[validate(nested)]
    pub profile2: BirthProfile,
}

/// Request to compare the caller's reading against the one bound to a code
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompareByCodeRequest {
    #[serde(rename = "readingSnapshot")]
    #[validate(nested)]
    pub reading_snapshot: ReadingSnapshot,
    #[serde(rename = "matchType", default = "default_match_type")]
    pub match_type: MatchType,
}

fn default_match_type() -> MatchType {
    MatchType::Romantic
}

/// Request to create an invitation from the caller
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub message: Option<String>,
}

/// Request to create a pending match between two parties
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMatchRequest {
    #[serde(rename = "partyA")]
    #[validate(nested)]
    pub party_a: PartyRef,
    #[serde(rename = "partyB")]
    #[validate(nested)]
    pub party_b: PartyRef,
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
}

/// Request to attach scores and analysis to a match
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompleteMatchRequest {
    #[validate(custom(function = "validate_scores"))]
    pub scores: MatchScores,
    pub analysis: MatchAnalysis,
}

fn validate_scores(scores: &MatchScores) -> Result<(), ValidationError> {
    let all = [
        scores.overall,
        scores.affinity,
        scores.communication,
        scores.life_direction,
        scores.vitality,
    ];
    if all.iter().any(|s| *s > 100) {
        return Err(ValidationError::new("score_out_of_range"));
    }
    Ok(())
}

/// Query for the public discovery feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverQuery {
    #[serde(default = "default_feed_limit")]
    pub limit: u16,
}

fn default_feed_limit() -> u16 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_out_of_range_rejected() {
        let req = CompleteMatchRequest {
            scores: MatchScores {
                overall: 101,
                affinity: 80,
                communication: 80,
                life_direction: 80,
                vitality: 80,
            },
            analysis: MatchAnalysis::default(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_compare_defaults_to_romantic() {
        let json = r#"{
            "readingSnapshot": {
                "displayName": "Ana",
                "reading": {"lines": {}, "mounts": {}},
                "profile": {"name": "Ana", "dateOfBirth": "1990-08-05"}
            }
        }"#;
        let req: CompareByCodeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.match_type, MatchType::Romantic);
        assert!(req.validate().is_ok());
    }
}
