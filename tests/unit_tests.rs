// Unit tests for the compatibility engine

use chrono::NaiveDate;
use compat_engine::core::{
    astro::{compat_for_signs, modality_alignment, sign_pair_score, DEFAULT_SIGN_SCORE},
    correlator::combine,
    scoring::{calculate_palm_scores, prominence_compatible, AFFINITY},
    sign_for_date, Matcher, Modality, Sign,
};
use compat_engine::models::{
    BirthProfile, CorrelationWeights, LineEntry, MountEntry, Prominence, ReadingDocument,
    ReadingSnapshot, ScoringWeights,
};
use std::collections::BTreeMap;

fn create_test_reading(heart: &str, venus: Prominence) -> ReadingDocument {
    let mut lines = BTreeMap::new();
    lines.insert(
        "heartLine".to_string(),
        LineEntry {
            description: heart.to_string(),
            ..Default::default()
        },
    );
    let mut mounts = BTreeMap::new();
    mounts.insert(
        "mountOfVenus".to_string(),
        MountEntry {
            prominence: venus,
            meaning: String::new(),
        },
    );
    ReadingDocument { lines, mounts }
}

fn empty_reading() -> ReadingDocument {
    ReadingDocument {
        lines: BTreeMap::new(),
        mounts: BTreeMap::new(),
    }
}

fn create_test_profile(name: &str, y: i32, m: u32, d: u32) -> BirthProfile {
    BirthProfile {
        name: name.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        time_of_birth: None,
        place_of_birth: None,
        relationship_status: None,
    }
}

#[test]
fn test_deep_heart_lines_and_developed_venus_raise_affinity() {
    let r1 = create_test_reading("A deep, steady heart line", Prominence::Prominent);
    let r2 = create_test_reading("Deep and long", Prominence::Prominent);

    let scores = calculate_palm_scores(&r1, &r2, &ScoringWeights::default());

    assert!(scores.affinity > AFFINITY.base);
}

#[test]
fn test_empty_readings_score_at_base() {
    let scores = calculate_palm_scores(&empty_reading(), &empty_reading(), &ScoringWeights::default());

    assert_eq!(scores.affinity, 65);
    assert_eq!(scores.communication, 60);
    assert_eq!(scores.life_direction, 62);
    assert_eq!(scores.vitality, 65);
    assert!(scores.overall <= 100);
}

#[test]
fn test_scoring_is_symmetric() {
    let r1 = create_test_reading("deep and curved", Prominence::Slight);
    let r2 = create_test_reading("short but warm", Prominence::Moderate);
    let weights = ScoringWeights::default();

    assert_eq!(
        calculate_palm_scores(&r1, &r2, &weights),
        calculate_palm_scores(&r2, &r1, &weights)
    );
}

#[test]
fn test_prominence_two_steps_apart_incompatible() {
    assert!(prominence_compatible(Prominence::Slight, Prominence::Moderate));
    assert!(!prominence_compatible(Prominence::Slight, Prominence::Prominent));
}

#[test]
fn test_every_sign_pair_resolves() {
    for a in Sign::ALL {
        for b in Sign::ALL {
            let compat = compat_for_signs(a, b);
            assert!(compat.sign_score <= 100);
            assert!(compat.elemental_harmony.score <= 100);
            assert!(compat.modality_alignment.score <= 100);
            assert!(compat.composite() <= 100);
        }
    }
}

#[test]
fn test_modality_alignment_symmetric() {
    for a in Modality::ALL {
        for b in Modality::ALL {
            assert_eq!(modality_alignment(a, b).score, modality_alignment(b, a).score);
        }
    }
}

#[test]
fn test_sign_scores_never_below_zero_default() {
    // Every pair is listed, so the default only matters as a floor for future edits
    assert_eq!(DEFAULT_SIGN_SCORE, 70);
    assert_eq!(sign_pair_score(Sign::Leo, Sign::Sagittarius), sign_pair_score(Sign::Sagittarius, Sign::Leo));
}

#[test]
fn test_sign_boundaries() {
    assert_eq!(sign_for_date(NaiveDate::from_ymd_opt(2000, 3, 21).unwrap()), Sign::Aries);
    assert_eq!(sign_for_date(NaiveDate::from_ymd_opt(2000, 3, 20).unwrap()), Sign::Pisces);
    assert_eq!(sign_for_date(NaiveDate::from_ymd_opt(2000, 12, 31).unwrap()), Sign::Capricorn);
    assert_eq!(sign_for_date(NaiveDate::from_ymd_opt(2000, 1, 19).unwrap()), Sign::Capricorn);
    assert_eq!(sign_for_date(NaiveDate::from_ymd_opt(2000, 1, 20).unwrap()), Sign::Aquarius);
}

#[test]
fn test_correlation_overall_in_range_with_tags() {
    let palm = calculate_palm_scores(&empty_reading(), &empty_reading(), &ScoringWeights::default());
    let astro = compat_for_signs(Sign::Aries, Sign::Cancer);

    let correlation = combine(&palm, &astro, &CorrelationWeights::default());

    assert!(correlation.overall_score <= 100);
    assert!(!correlation.correlation_tags.is_empty());
}

#[test]
fn test_matcher_evaluate_pipeline() {
    let a = ReadingSnapshot {
        display_name: "Ana".to_string(),
        reading: create_test_reading("deep", Prominence::Prominent),
        profile: create_test_profile("Ana", 1990, 8, 5),
    };
    let b = ReadingSnapshot {
        display_name: "Ben".to_string(),
        reading: create_test_reading("deep", Prominence::Moderate),
        profile: create_test_profile("Ben", 1991, 12, 1),
    };

    let matcher = Matcher::with_default_weights();
    let report = matcher.evaluate(&a, &b);
    let reversed = matcher.evaluate(&b, &a);

    assert_eq!(report.astro.sign1, Sign::Leo);
    assert_eq!(report.astro.sign2, Sign::Sagittarius);
    assert_eq!(report.palm, reversed.palm);
    assert_eq!(report.correlation.overall_score, reversed.correlation.overall_score);
    assert_eq!(report.match_scores().overall, report.correlation.overall_score);
}

#[test]
fn test_matcher_rejects_unbalanced_weights() {
    let weights = ScoringWeights {
        affinity: 0.5,
        communication: 0.5,
        life_direction: 0.5,
        vitality: 0.5,
    };
    assert!(Matcher::try_new(weights, CorrelationWeights::default()).is_err());
}

#[test]
fn test_unknown_prominence_label_fails_fast() {
    let json = r#"{"lines": {}, "mounts": {"venus": {"prominence": "gigantic"}}}"#;
    assert!(serde_json::from_str::<ReadingDocument>(json).is_err());

    let json = r#"{"lines": {"heart_line": {}}, "mounts": {"venus": {"prominence": "Well-Developed"}}}"#;
    let reading: ReadingDocument = serde_json::from_str(json).unwrap();
    assert_eq!(reading.mount_prominence("Venus"), Some(Prominence::Prominent));
    assert_eq!(reading.line_description("Heart Line"), "");
}
