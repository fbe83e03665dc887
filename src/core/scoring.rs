use serde::{Deserialize, Serialize};

use crate::models::{Prominence, ReadingDocument, ScoringWeights, ValidationError};

/// Palm-reading compatibility of two readings, each score 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalmScores {
    pub overall: u8,
    pub affinity: u8,
    pub communication: u8,
    #[serde(rename = "lifeDirection")]
    pub life_direction: u8,
    pub vitality: u8,
}

/// A set of keywords that earns `bonus` when both readings mention one of them
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub bonus: u8,
}

/// Keyword rules applied to one line's description
#[derive(Debug, Clone, Copy)]
pub struct LineFactor {
    pub line: &'static str,
    pub rules: &'static [KeywordRule],
}

/// Definition of one sub-score: base value, inspected lines, and the mount whose
/// prominence is compared
#[derive(Debug, Clone, Copy)]
pub struct FactorTable {
    pub base: u8,
    pub lines: &'static [LineFactor],
    pub mount: &'static str,
    pub mount_bonus: u8,
}

pub const AFFINITY: FactorTable = FactorTable {
    base: 65,
    lines: &[
        LineFactor {
            line: "heartLine",
            rules: &[
                KeywordRule { keywords: &["deep", "long", "strong"], bonus: 10 },
                KeywordRule { keywords: &["curved", "warm", "emotional", "passionate"], bonus: 8 },
            ],
        },
        LineFactor {
            line: "marriageLine",
            rules: &[KeywordRule { keywords: &["clear", "strong", "committed", "lasting"], bonus: 7 }],
        },
    ],
    mount: "venus",
    mount_bonus: 10,
};

pub const COMMUNICATION: FactorTable = FactorTable {
    base: 60,
    lines: &[LineFactor {
        line: "headLine",
        rules: &[
            KeywordRule { keywords: &["clear", "long", "straight", "analytical"], bonus: 10 },
            KeywordRule { keywords: &["creative", "curved", "imaginative", "intuitive"], bonus: 10 },
        ],
    }],
    mount: "mercury",
    mount_bonus: 10,
};

pub const LIFE_DIRECTION: FactorTable = FactorTable {
    base: 62,
    lines: &[
        LineFactor {
            line: "fateLine",
            rules: &[KeywordRule { keywords: &["strong", "clear", "deep", "steady"], bonus: 10 }],
        },
        LineFactor {
            line: "successLine",
            rules: &[KeywordRule { keywords: &["bright", "clear", "strong", "recognition"], bonus: 8 }],
        },
    ],
    mount: "jupiter",
    mount_bonus: 10,
};

pub const VITALITY: FactorTable = FactorTable {
    base: 65,
    lines: &[LineFactor {
        line: "lifeLine",
        rules: &[
            KeywordRule { keywords: &["long", "strong", "deep", "vital", "energetic"], bonus: 12 },
            KeywordRule { keywords: &["curved", "wide", "robust"], bonus: 8 },
        ],
    }],
    mount: "mars",
    mount_bonus: 10,
};

/// Score two readings against each other
///
/// Pure and deterministic; every factor is symmetric in its two arguments, so
/// `calculate_palm_scores(a, b, w) == calculate_palm_scores(b, a, w)`.
pub fn calculate_palm_scores(
    reading1: &ReadingDocument,
    reading2: &ReadingDocument,
    weights: &ScoringWeights,
) -> PalmScores {
    let affinity = factor_score(&AFFINITY, reading1, reading2);
    let communication = factor_score(&COMMUNICATION, reading1, reading2);
    let life_direction = factor_score(&LIFE_DIRECTION, reading1, reading2);
    let vitality = factor_score(&VITALITY, reading1, reading2);

    let overall = affinity as f64 * weights.affinity
        + communication as f64 * weights.communication
        + life_direction as f64 * weights.life_direction
        + vitality as f64 * weights.vitality;

    PalmScores {
        overall: clamp_score(overall),
        affinity,
        communication,
        life_direction,
        vitality,
    }
}

/// Compute one sub-score from its factor table
pub fn factor_score(table: &FactorTable, reading1: &ReadingDocument, reading2: &ReadingDocument) -> u8 {
    let mut score = table.base as u32;

    for factor in table.lines {
        let text1 = reading1.line_description(factor.line).to_lowercase();
        let text2 = reading2.line_description(factor.line).to_lowercase();

        for rule in factor.rules {
            if contains_any(&text1, rule.keywords) && contains_any(&text2, rule.keywords) {
                score += rule.bonus as u32;
            }
        }
    }

    if let (Some(p1), Some(p2)) = (
        reading1.mount_prominence(table.mount),
        reading2.mount_prominence(table.mount),
    ) {
        if prominence_compatible(p1, p2) {
            score += table.mount_bonus as u32;
        }
    }

    score.min(100) as u8
}

/// Two mounts are compatible when their levels differ by at most one step
#[inline]
pub fn prominence_compatible(p1: Prominence, p2: Prominence) -> bool {
    p1.level().abs_diff(p2.level()) <= 1
}

#[inline]
fn contains_any(text: &str, keywords: &[&str]) -> bool {
    !text.is_empty() && keywords.iter().any(|k| text.contains(k))
}

#[inline]
pub(crate) fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Reject weight sets that are negative or do not sum to 1.0
pub fn validate_weights(weights: &ScoringWeights) -> Result<(), ValidationError> {
    let parts = [
        weights.affinity,
        weights.communication,
        weights.life_direction,
        weights.vitality,
    ];
    if parts.iter().any(|w| *w < 0.0 || !w.is_finite()) {
        return Err(ValidationError::InvalidField {
            field: "weights".to_string(),
            message: "scoring weights must be non-negative".to_string(),
        });
    }
    if (weights.total() - 1.0).abs() > 1e-3 {
        return Err(ValidationError::InvalidField {
            field: "weights".to_string(),
            message: format!("scoring weights must sum to 1.0, got {:.3}", weights.total()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineEntry, MountEntry};
    use std::collections::BTreeMap;

    fn create_reading(lines: &[(&str, &str)], mounts: &[(&str, Prominence)]) -> ReadingDocument {
        ReadingDocument {
            lines: lines
                .iter()
                .map(|(name, description)| {
                    (
                        name.to_string(),
                        LineEntry {
                            description: description.to_string(),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
            mounts: mounts
                .iter()
                .map(|(name, prominence)| {
                    (
                        name.to_string(),
                        MountEntry {
                            prominence: *prominence,
                            meaning: String::new(),
                        },
                    )
                })
                .collect(),
        }
    }

    fn empty_reading() -> ReadingDocument {
        ReadingDocument {
            lines: BTreeMap::new(),
            mounts: BTreeMap::new(),
        }
    }

    #[test]
    fn test_empty_readings_score_base() {
        let scores = calculate_palm_scores(&empty_reading(), &empty_reading(), &ScoringWeights::default());

        assert_eq!(scores.affinity, AFFINITY.base);
        assert_eq!(scores.communication, COMMUNICATION.base);
        assert_eq!(scores.life_direction, LIFE_DIRECTION.base);
        assert_eq!(scores.vitality, VITALITY.base);
    }

    #[test]
    fn test_keyword_needs_both_readings() {
        let r1 = create_reading(&[("heartLine", "A deep heart line")], &[]);
        let r2 = create_reading(&[("heartLine", "Faint and short")], &[]);

        assert_eq!(factor_score(&AFFINITY, &r1, &r2), AFFINITY.base);
        assert_eq!(factor_score(&AFFINITY, &r1, &r1), AFFINITY.base + 10);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let r1 = create_reading(&[("lifeLine", "LONG and Robust")], &[]);
        let r2 = create_reading(&[("life_line", "long, wide arc")], &[]);

        assert_eq!(factor_score(&VITALITY, &r1, &r2), VITALITY.base + 12 + 8);
    }

    #[test]
    fn test_prominence_compatible() {
        assert!(prominence_compatible(Prominence::Slight, Prominence::Moderate));
        assert!(prominence_compatible(Prominence::Prominent, Prominence::Prominent));
        assert!(!prominence_compatible(Prominence::Slight, Prominence::Prominent));
    }

    #[test]
    fn test_mount_bonus() {
        let r1 = create_reading(&[], &[("mercury", Prominence::Prominent)]);
        let r2 = create_reading(&[], &[("mercury", Prominence::Moderate)]);
        let r3 = create_reading(&[], &[("mercury", Prominence::Slight)]);

        assert_eq!(factor_score(&COMMUNICATION, &r1, &r2), COMMUNICATION.base + 10);
        assert_eq!(factor_score(&COMMUNICATION, &r1, &r3), COMMUNICATION.base);
        // Missing mount on one side earns nothing
        assert_eq!(factor_score(&COMMUNICATION, &r1, &empty_reading()), COMMUNICATION.base);
    }

    #[test]
    fn test_scores_are_clamped() {
        let r = create_reading(
            &[
                ("heartLine", "deep, long and passionate"),
                ("marriageLine", "clear and lasting"),
            ],
            &[("venus", Prominence::Prominent)],
        );
        let scores = calculate_palm_scores(&r, &r, &ScoringWeights::default());
        assert_eq!(scores.affinity, 100);
        assert!(scores.overall <= 100);
    }

    #[test]
    fn test_overall_is_weighted_average() {
        let weights = ScoringWeights {
            affinity: 1.0,
            communication: 0.0,
            life_direction: 0.0,
            vitality: 0.0,
        };
        let scores = calculate_palm_scores(&empty_reading(), &empty_reading(), &weights);
        assert_eq!(scores.overall, scores.affinity);
    }

    #[test]
    fn test_validate_weights() {
        assert!(validate_weights(&ScoringWeights::default()).is_ok());
        let bad = ScoringWeights {
            affinity: 0.5,
            ..ScoringWeights::default()
        };
        assert!(matches!(
            validate_weights(&bad),
            Err(ValidationError::InvalidField { field, .. }) if field == "weights"
        ));
    }
}
