use serde::{Deserialize, Serialize};

use crate::core::signs::{Element, Modality, Sign};
use crate::models::BirthProfile;

/// Score for a sign pair that is missing from the sign table
pub const DEFAULT_SIGN_SCORE: u8 = 70;

/// Unordered sign pairs and their compatibility, each pair listed once
const SIGN_PAIR_SCORES: [(Sign, Sign, u8); 78] = [
    (Sign::Aries, Sign::Aries, 70),
    (Sign::Aries, Sign::Taurus, 55),
    (Sign::Aries, Sign::Gemini, 82),
    (Sign::Aries, Sign::Cancer, 47),
    (Sign::Aries, Sign::Leo, 93),
    (Sign::Aries, Sign::Virgo, 48),
    (Sign::Aries, Sign::Libra, 74),
    (Sign::Aries, Sign::Scorpio, 48),
    (Sign::Aries, Sign::Sagittarius, 91),
    (Sign::Aries, Sign::Capricorn, 52),
    (Sign::Aries, Sign::Aquarius, 82),
    (Sign::Aries, Sign::Pisces, 55),
    (Sign::Taurus, Sign::Taurus, 75),
    (Sign::Taurus, Sign::Gemini, 55),
    (Sign::Taurus, Sign::Cancer, 88),
    (Sign::Taurus, Sign::Leo, 52),
    (Sign::Taurus, Sign::Virgo, 91),
    (Sign::Taurus, Sign::Libra, 48),
    (Sign::Taurus, Sign::Scorpio, 80),
    (Sign::Taurus, Sign::Sagittarius, 48),
    (Sign::Taurus, Sign::Capricorn, 94),
    (Sign::Taurus, Sign::Aquarius, 52),
    (Sign::Taurus, Sign::Pisces, 82),
    (Sign::Gemini, Sign::Gemini, 75),
    (Sign::Gemini, Sign::Cancer, 55),
    (Sign::Gemini, Sign::Leo, 82),
    (Sign::Gemini, Sign::Virgo, 58),
    (Sign::Gemini, Sign::Libra, 91),
    (Sign::Gemini, Sign::Scorpio, 48),
    (Sign::Gemini, Sign::Sagittarius, 74),
    (Sign::Gemini, Sign::Capricorn, 48),
    (Sign::Gemini, Sign::Aquarius, 92),
    (Sign::Gemini, Sign::Pisces, 52),
    (Sign::Cancer, Sign::Cancer, 75),
    (Sign::Cancer, Sign::Leo, 55),
    (Sign::Cancer, Sign::Virgo, 82),
    (Sign::Cancer, Sign::Libra, 52),
    (Sign::Cancer, Sign::Scorpio, 94),
    (Sign::Cancer, Sign::Sagittarius, 48),
    (Sign::Cancer, Sign::Capricorn, 70),
    (Sign::Cancer, Sign::Aquarius, 48),
    (Sign::Cancer, Sign::Pisces, 93),
    (Sign::Leo, Sign::Leo, 75),
    (Sign::Leo, Sign::Virgo, 55),
    (Sign::Leo, Sign::Libra, 82),
    (Sign::Leo, Sign::Scorpio, 54),
    (Sign::Leo, Sign::Sagittarius, 92),
    (Sign::Leo, Sign::Capricorn, 48),
    (Sign::Leo, Sign::Aquarius, 76),
    (Sign::Leo, Sign::Pisces, 48),
    (Sign::Virgo, Sign::Virgo, 75),
    (Sign::Virgo, Sign::Libra, 55),
    (Sign::Virgo, Sign::Scorpio, 82),
    (Sign::Virgo, Sign::Sagittarius, 50),
    (Sign::Virgo, Sign::Capricorn, 92),
    (Sign::Virgo, Sign::Aquarius, 48),
    (Sign::Virgo, Sign::Pisces, 73),
    (Sign::Libra, Sign::Libra, 75),
    (Sign::Libra, Sign::Scorpio, 55),
    (Sign::Libra, Sign::Sagittarius, 82),
    (Sign::Libra, Sign::Capricorn, 54),
    (Sign::Libra, Sign::Aquarius, 90),
    (Sign::Libra, Sign::Pisces, 48),
    (Sign::Scorpio, Sign::Scorpio, 68),
    (Sign::Scorpio, Sign::Sagittarius, 55),
    (Sign::Scorpio, Sign::Capricorn, 82),
    (Sign::Scorpio, Sign::Aquarius, 52),
    (Sign::Scorpio, Sign::Pisces, 95),
    (Sign::Sagittarius, Sign::Sagittarius, 75),
    (Sign::Sagittarius, Sign::Capricorn, 55),
    (Sign::Sagittarius, Sign::Aquarius, 82),
    (Sign::Sagittarius, Sign::Pisces, 55),
    (Sign::Capricorn, Sign::Capricorn, 75),
    (Sign::Capricorn, Sign::Aquarius, 55),
    (Sign::Capricorn, Sign::Pisces, 82),
    (Sign::Aquarius, Sign::Aquarius, 75),
    (Sign::Aquarius, Sign::Pisces, 55),
    (Sign::Pisces, Sign::Pisces, 75),
];

/// Element compatibility, indexed by `Element::index`; symmetric
const ELEMENT_MATRIX: [[u8; 4]; 4] = [
    // Fire Earth Air Water
    [90, 55, 85, 50], // Fire
    [55, 90, 55, 85], // Earth
    [85, 55, 90, 55], // Air
    [50, 85, 55, 90], // Water
];

/// Upper triangle of the modality matrix, indexed by `Modality::index`
const MODALITY_TRIANGLE: [[u8; 3]; 3] = [
    // Cardinal Fixed Mutable
    [65, 60, 80],
    [0, 60, 75],
    [0, 0, 80],
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementalHarmony {
    pub element1: Element,
    pub element2: Element,
    pub score: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityAlignment {
    pub modality1: Modality,
    pub modality2: Modality,
    pub score: u8,
    pub description: String,
}

/// Astrological compatibility of two birth profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstroCompatibility {
    pub sign1: Sign,
    pub sign2: Sign,
    #[serde(rename = "signScore")]
    pub sign_score: u8,
    #[serde(rename = "elementalHarmony")]
    pub elemental_harmony: ElementalHarmony,
    #[serde(rename = "modalityAlignment")]
    pub modality_alignment: ModalityAlignment,
}

impl AstroCompatibility {
    /// Single astrology score: sign 50%, element 30%, modality 20%
    pub fn composite(&self) -> u8 {
        let blended = self.sign_score as f64 * 0.5
            + self.elemental_harmony.score as f64 * 0.3
            + self.modality_alignment.score as f64 * 0.2;
        blended.round().clamp(0.0, 100.0) as u8
    }
}

/// Compare the signs, elements and modalities of two profiles
pub fn astro_compat(profile1: &BirthProfile, profile2: &BirthProfile) -> AstroCompatibility {
    compat_for_signs(profile1.sign(), profile2.sign())
}

pub fn compat_for_signs(sign1: Sign, sign2: Sign) -> AstroCompatibility {
    AstroCompatibility {
        sign1,
        sign2,
        sign_score: sign_pair_score(sign1, sign2),
        elemental_harmony: elemental_harmony(sign1.element(), sign2.element()),
        modality_alignment: modality_alignment(sign1.modality(), sign2.modality()),
    }
}

/// Look up an unordered sign pair, falling back to [`DEFAULT_SIGN_SCORE`]
pub fn sign_pair_score(sign1: Sign, sign2: Sign) -> u8 {
    SIGN_PAIR_SCORES
        .iter()
        .find(|(a, b, _)| (*a == sign1 && *b == sign2) || (*a == sign2 && *b == sign1))
        .map(|(_, _, score)| *score)
        .unwrap_or(DEFAULT_SIGN_SCORE)
}

pub fn elemental_harmony(element1: Element, element2: Element) -> ElementalHarmony {
    let score = ELEMENT_MATRIX[element1.index()][element2.index()];

    let description = if element1 == element2 {
        format!("Shared {} nature: an instinctive understanding of each other", element1)
    } else if is_complementary(element1, element2) {
        format!("{} and {} feed each other and balance naturally", element1, element2)
    } else {
        format!("{} and {} move differently and need conscious balance", element1, element2)
    };

    ElementalHarmony {
        element1,
        element2,
        score,
        description,
    }
}

pub fn modality_alignment(modality1: Modality, modality2: Modality) -> ModalityAlignment {
    let (low, high) = if modality1.index() <= modality2.index() {
        (modality1, modality2)
    } else {
        (modality2, modality1)
    };
    let score = MODALITY_TRIANGLE[low.index()][high.index()];

    let description = match (low, high) {
        (Modality::Cardinal, Modality::Cardinal) => {
            "Two initiators: plenty of drive, but someone has to follow".to_string()
        }
        (Modality::Fixed, Modality::Fixed) => {
            "Two steady forces: loyal and stubborn in equal measure".to_string()
        }
        (Modality::Mutable, Modality::Mutable) => {
            "Two adapters: easygoing and flexible, sometimes without direction".to_string()
        }
        (Modality::Cardinal, Modality::Fixed) => {
            "One starts, one sustains: productive when roles are respected".to_string()
        }
        (Modality::Cardinal, Modality::Mutable) => {
            "One leads, one adapts: an easy rhythm of action and flexibility".to_string()
        }
        _ => "One anchors, one adjusts: stability with room to grow".to_string(),
    };

    ModalityAlignment {
        modality1,
        modality2,
        score,
        description,
    }
}

#[inline]
fn is_complementary(element1: Element, element2: Element) -> bool {
    matches!(
        (element1, element2),
        (Element::Fire, Element::Air)
            | (Element::Air, Element::Fire)
            | (Element::Earth, Element::Water)
            | (Element::Water, Element::Earth)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_profile(name: &str, y: i32, m: u32, d: u32) -> BirthProfile {
        BirthProfile {
            name: name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            time_of_birth: None,
            place_of_birth: None,
            relationship_status: None,
        }
    }

    #[test]
    fn test_every_unordered_pair_listed_once() {
        for (i, a) in Sign::ALL.iter().enumerate() {
            for b in &Sign::ALL[i..] {
                let count = SIGN_PAIR_SCORES
                    .iter()
                    .filter(|(x, y, _)| (x == a && y == b) || (x == b && y == a))
                    .count();
                assert_eq!(count, 1, "{} / {} listed {} times", a, b, count);
            }
        }
    }

    #[test]
    fn test_all_sign_pairs_in_range() {
        for a in Sign::ALL {
            for b in Sign::ALL {
                let result = compat_for_signs(a, b);
                assert!(result.sign_score <= 100);
                assert!(result.elemental_harmony.score <= 100);
                assert!(result.modality_alignment.score <= 100);
                assert_eq!(sign_pair_score(a, b), sign_pair_score(b, a));
            }
        }
    }

    #[test]
    fn test_identical_elements_beat_cross_pairs() {
        for a in Element::ALL {
            let same = elemental_harmony(a, a).score;
            for b in Element::ALL.iter().filter(|b| **b != a) {
                assert!(same > elemental_harmony(a, *b).score);
                assert_eq!(elemental_harmony(a, *b).score, elemental_harmony(*b, a).score);
            }
        }
    }

    #[test]
    fn test_modality_symmetry() {
        for a in Modality::ALL {
            for b in Modality::ALL {
                let ab = modality_alignment(a, b);
                let ba = modality_alignment(b, a);
                assert_eq!(ab.score, ba.score);
                assert_eq!(ab.description, ba.description);
                assert!(ab.score > 0);
            }
        }
    }

    #[test]
    fn test_astro_compat_from_profiles() {
        let leo = create_profile("Leo", 1990, 8, 5);
        let sag = create_profile("Sag", 1991, 12, 1);

        let result = astro_compat(&leo, &sag);

        assert_eq!(result.sign1, Sign::Leo);
        assert_eq!(result.sign2, Sign::Sagittarius);
        assert_eq!(result.sign_score, 92);
        assert_eq!(result.elemental_harmony.element1, Element::Fire);
        assert_eq!(result.elemental_harmony.score, 90);
        assert_eq!(result.modality_alignment.score, 75);
        assert!(result.composite() > 80);
    }
}
