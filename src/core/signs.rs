use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tropical zodiac sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

/// Classical element of a sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

/// Modality (quality) of a sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Cardinal,
    Fixed,
    Mutable,
}

/// Traditional ruling planet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ruler {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Sign {
    pub const ALL: [Sign; 12] = [
        Sign::Aries,
        Sign::Taurus,
        Sign::Gemini,
        Sign::Cancer,
        Sign::Leo,
        Sign::Virgo,
        Sign::Libra,
        Sign::Scorpio,
        Sign::Sagittarius,
        Sign::Capricorn,
        Sign::Aquarius,
        Sign::Pisces,
    ];

    /// Position in the zodiac, Aries = 0
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn element(self) -> Element {
        match self {
            Sign::Aries | Sign::Leo | Sign::Sagittarius => Element::Fire,
            Sign::Taurus | Sign::Virgo | Sign::Capricorn => Element::Earth,
            Sign::Gemini | Sign::Libra | Sign::Aquarius => Element::Air,
            Sign::Cancer | Sign::Scorpio | Sign::Pisces => Element::Water,
        }
    }

    pub fn modality(self) -> Modality {
        match self {
            Sign::Aries | Sign::Cancer | Sign::Libra | Sign::Capricorn => Modality::Cardinal,
            Sign::Taurus | Sign::Leo | Sign::Scorpio | Sign::Aquarius => Modality::Fixed,
            Sign::Gemini | Sign::Virgo | Sign::Sagittarius | Sign::Pisces => Modality::Mutable,
        }
    }

    /// Modern rulerships (outer planets for Scorpio, Aquarius, Pisces)
    pub fn ruler(self) -> Ruler {
        match self {
            Sign::Aries => Ruler::Mars,
            Sign::Taurus => Ruler::Venus,
            Sign::Gemini => Ruler::Mercury,
            Sign::Cancer => Ruler::Moon,
            Sign::Leo => Ruler::Sun,
            Sign::Virgo => Ruler::Mercury,
            Sign::Libra => Ruler::Venus,
            Sign::Scorpio => Ruler::Pluto,
            Sign::Sagittarius => Ruler::Jupiter,
            Sign::Capricorn => Ruler::Saturn,
            Sign::Aquarius => Ruler::Uranus,
            Sign::Pisces => Ruler::Neptune,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Sign::Aries => "Aries",
            Sign::Taurus => "Taurus",
            Sign::Gemini => "Gemini",
            Sign::Cancer => "Cancer",
            Sign::Leo => "Leo",
            Sign::Virgo => "Virgo",
            Sign::Libra => "Libra",
            Sign::Scorpio => "Scorpio",
            Sign::Sagittarius => "Sagittarius",
            Sign::Capricorn => "Capricorn",
            Sign::Aquarius => "Aquarius",
            Sign::Pisces => "Pisces",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Fire, Element::Earth, Element::Air, Element::Water];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Air => "Air",
            Element::Water => "Water",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Cardinal, Modality::Fixed, Modality::Mutable];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Modality::Cardinal => "Cardinal",
            Modality::Fixed => "Fixed",
            Modality::Mutable => "Mutable",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Last day (inclusive) of each sign's span, starting with Capricorn's tail in January.
///
/// Each entry is `(month, last_day, sign)`; a date belongs to the first entry whose
/// `(month, last_day)` is not before it.
const SIGN_BOUNDARIES: [(u32, u32, Sign); 13] = [
    (1, 19, Sign::Capricorn),
    (2, 18, Sign::Aquarius),
    (3, 20, Sign::Pisces),
    (4, 19, Sign::Aries),
    (5, 20, Sign::Taurus),
    (6, 20, Sign::Gemini),
    (7, 22, Sign::Cancer),
    (8, 22, Sign::Leo),
    (9, 22, Sign::Virgo),
    (10, 22, Sign::Libra),
    (11, 21, Sign::Scorpio),
    (12, 21, Sign::Sagittarius),
    (12, 31, Sign::Capricorn),
];

/// Resolve the sun sign for a date of birth
pub fn sign_for_date(date: NaiveDate) -> Sign {
    let key = (date.month(), date.day());
    SIGN_BOUNDARIES
        .iter()
        .find(|(month, last_day, _)| key <= (*month, *last_day))
        .map(|(_, _, sign)| *sign)
        .unwrap_or(Sign::Capricorn)
}
