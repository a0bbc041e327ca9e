//! Proficiency Model: maps a raw 0–100 slider value onto a discrete skill level.

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of each level, in ascending order. Anything above the
/// last breakpoint is `Expert`.
const BREAKPOINTS: &[(i64, Level)] = &[
    (12, Level::Novice),
    (37, Level::Beginner),
    (62, Level::Intermediate),
    (87, Level::Advanced),
];

pub const MIN_RAW: i64 = 0;
pub const MAX_RAW: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Novice,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Level {
    pub fn label(&self) -> &'static str {
        match self {
            Level::Novice => "Novice",
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
            Level::Expert => "Expert",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Level::Novice => "Just getting started, little hands-on experience",
            Level::Beginner => "Knows the basics, needs guidance on real tasks",
            Level::Intermediate => "Works independently on typical tasks",
            Level::Advanced => "Handles complex work and mentors others",
            Level::Expert => "Recognized authority, shapes how others work",
        }
    }
}

/// Returns the level for a raw rating. Out-of-range input is clamped, never rejected:
/// sliders can emit values just past either end under floating-point rounding.
pub fn level_of(raw: i64) -> Level {
    let raw = raw.clamp(MIN_RAW, MAX_RAW);
    BREAKPOINTS
        .iter()
        .find(|(upper, _)| raw <= *upper)
        .map(|(_, level)| *level)
        .unwrap_or(Level::Expert)
}

/// Normalizes a slider value into the 0–100 integer range. NaN counts as 0.
pub fn clamp_raw(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(MIN_RAW as f64, MAX_RAW as f64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_table() {
        let cases = [
            (0, Level::Novice),
            (12, Level::Novice),
            (13, Level::Beginner),
            (37, Level::Beginner),
            (38, Level::Intermediate),
            (62, Level::Intermediate),
            (63, Level::Advanced),
            (87, Level::Advanced),
            (88, Level::Expert),
            (100, Level::Expert),
        ];
        for (raw, expected) in cases {
            assert_eq!(level_of(raw), expected, "raw={raw}");
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(level_of(-5), Level::Novice);
        assert_eq!(level_of(101), Level::Expert);
        assert_eq!(level_of(i64::MAX), Level::Expert);
    }

    #[test]
    fn test_level_is_monotonic_over_full_range() {
        let mut previous = level_of(0);
        for raw in 1..=100 {
            let level = level_of(raw);
            assert!(level >= previous, "level dropped at raw={raw}");
            previous = level;
        }
    }

    #[test]
    fn test_clamp_raw_rounds_and_clamps() {
        assert_eq!(clamp_raw(62.4), 62);
        assert_eq!(clamp_raw(62.5), 63);
        assert_eq!(clamp_raw(-0.0001), 0);
        assert_eq!(clamp_raw(100.0000001), 100);
        assert_eq!(clamp_raw(f64::NAN), 0);
        assert_eq!(clamp_raw(f64::INFINITY), 100);
    }

    #[test]
    fn test_labels_match_serialized_names() {
        for level in [
            Level::Novice,
            Level::Beginner,
            Level::Intermediate,
            Level::Advanced,
            Level::Expert,
        ] {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.label()));
        }
    }
}
