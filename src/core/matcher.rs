use serde::{Deserialize, Serialize};

use crate::core::{
    astro::{astro_compat, AstroCompatibility},
    correlator::{combine, Correlation},
    scoring::{calculate_palm_scores, validate_weights, PalmScores},
};
use crate::models::{
    BirthProfile, CorrelationWeights, MatchScores, ReadingDocument, ReadingSnapshot, ScoringWeights,
    ValidationError,
};

/// Full result of comparing two people
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub palm: PalmScores,
    pub astro: AstroCompatibility,
    pub correlation: Correlation,
}

impl CompatibilityReport {
    /// Scores persisted on a match; `overall` is the cross-system score
    pub fn match_scores(&self) -> MatchScores {
        MatchScores {
            overall: self.correlation.overall_score,
            affinity: self.palm.affinity,
            communication: self.palm.communication,
            life_direction: self.palm.life_direction,
            vitality: self.palm.vitality,
        }
    }
}

/// Compatibility orchestrator - runs the palm, astrology and correlation stages
///
/// # Pipeline Stages
/// 1. Palm scoring of both readings
/// 2. Astrological comparison of both birth profiles
/// 3. Cross-system correlation
///
/// Holds only immutable weights, so a single instance can be shared by any
/// number of concurrent callers.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    correlation: CorrelationWeights,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, correlation: CorrelationWeights) -> Self {
        Self { weights, correlation }
    }

    /// Build a matcher, rejecting weight sets that do not sum to 1.0
    pub fn try_new(
        weights: ScoringWeights,
        correlation: CorrelationWeights,
    ) -> Result<Self, ValidationError> {
        validate_weights(&weights)?;
        if (correlation.total() - 1.0).abs() > 1e-3 {
            return Err(ValidationError::InvalidField {
                field: "correlation".to_string(),
                message: format!("correlation weights must sum to 1.0, got {:.3}", correlation.total()),
            });
        }
        Ok(Self::new(weights, correlation))
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), CorrelationWeights::default())
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, reading1: &ReadingDocument, reading2: &ReadingDocument) -> PalmScores {
        calculate_palm_scores(reading1, reading2, &self.weights)
    }

    pub fn astro(&self, profile1: &BirthProfile, profile2: &BirthProfile) -> AstroCompatibility {
        astro_compat(profile1, profile2)
    }

    /// Run every stage for two snapshots
    pub fn evaluate(&self, a: &ReadingSnapshot, b: &ReadingSnapshot) -> CompatibilityReport {
        let palm = self.score(&a.reading, &b.reading);
        let astro = self.astro(&a.profile, &b.profile);
        let correlation = combine(&palm, &astro, &self.correlation);

        tracing::debug!(
            "Evaluated {} x {}: palm {}, astro {}, overall {}",
            a.display_name,
            b.display_name,
            palm.overall,
            astro.composite(),
            correlation.overall_score
        );

        CompatibilityReport {
            palm,
            astro,
            correlation,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
