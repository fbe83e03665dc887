use serde::{Deserialize, Serialize};

use crate::core::astro::AstroCompatibility;
use crate::core::scoring::{clamp_score, PalmScores};
use crate::models::CorrelationWeights;

/// Merged verdict of the palm and astrology systems
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    #[serde(rename = "overallScore")]
    pub overall_score: u8,
    #[serde(rename = "correlationBonus")]
    pub correlation_bonus: u8,
    #[serde(rename = "correlationTags")]
    pub correlation_tags: Vec<String>,
}

/// One palm sub-score paired with the astrological signal it is compared against
struct Pairing {
    palm: u8,
    astro: u8,
}

/// Blend palm scores and astrology into one overall score with narrative tags
///
/// overall = astro_composite * w.astrology + palm.overall * w.palm + bonus * w.bonus,
/// where bonus is the mean agreement (100 - |palm - astro|) across the four pairings.
pub fn combine(
    palm: &PalmScores,
    astro: &AstroCompatibility,
    weights: &CorrelationWeights,
) -> Correlation {
    let element = astro.elemental_harmony.score;
    let modality = astro.modality_alignment.score;
    let sign = astro.sign_score;

    let pairings = [
        Pairing { palm: palm.affinity, astro: element },
        Pairing { palm: palm.communication, astro: modality },
        Pairing { palm: palm.life_direction, astro: sign },
        Pairing { palm: palm.vitality, astro: element },
    ];

    let agreement: u32 = pairings
        .iter()
        .map(|p| 100 - p.palm.abs_diff(p.astro) as u32)
        .sum();
    let correlation_bonus = clamp_score(agreement as f64 / pairings.len() as f64);

    let overall = astro.composite() as f64 * weights.astrology
        + palm.overall as f64 * weights.palm
        + correlation_bonus as f64 * weights.bonus;

    Correlation {
        overall_score: clamp_score(overall),
        correlation_bonus,
        correlation_tags: correlation_tags(palm, astro, weights),
    }
}

/// Templated tags for the pairings where both systems agree
fn correlation_tags(
    palm: &PalmScores,
    astro: &AstroCompatibility,
    weights: &CorrelationWeights,
) -> Vec<String> {
    let strong = |v: u8| v >= weights.strong_threshold;
    let weak = |v: u8| v < weights.weak_threshold;

    let element = &astro.elemental_harmony;
    let modality = &astro.modality_alignment;
    let mut tags = Vec::new();

    if strong(palm.affinity) && strong(element.score) {
        tags.push(format!(
            "Heart line and Venus agree with {}-{} elemental harmony",
            element.element1, element.element2
        ));
    }
    if strong(palm.communication) && strong(modality.score) {
        tags.push(format!(
            "Head line rapport mirrored by {}-{} modality alignment",
            modality.modality1, modality.modality2
        ));
    }
    if strong(palm.life_direction) && strong(astro.sign_score) {
        tags.push(format!(
            "Fate lines and the {}-{} pairing point the same way",
            astro.sign1, astro.sign2
        ));
    }
    if strong(palm.vitality) && strong(element.score) {
        tags.push("Life lines and elemental energy are both strong".to_string());
    }

    if weak(palm.affinity) && weak(element.score) {
        tags.push("Both systems flag emotional connection as a growth area".to_string());
    }
    if weak(palm.communication) && weak(modality.score) {
        tags.push("Both systems flag communication as a growth area".to_string());
    }
    if weak(palm.life_direction) && weak(astro.sign_score) {
        tags.push("Both systems flag shared direction as a growth area".to_string());
    }

    if tags.is_empty() {
        tags.push("Palm and astrological signals are mixed".to_string());
    }

    tags
}
