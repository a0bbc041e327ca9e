use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::assessment::proficiency::{level_of, Level};

/// Separates the skill name from its occurrence index inside a rating key.
pub const KEY_SEPARATOR: &str = "::";

pub const MAX_CAREER_AREAS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Rating keys
// ────────────────────────────────────────────────────────────────────────────

/// Identifies one selected skill. The same name may be selected more than once
/// (it can sit under several catalog categories), so the occurrence index is part
/// of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RatingKey {
    pub skill_name: String,
    pub occurrence_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingKeyError {
    #[error("rating key '{0}' has no '::' separator")]
    MissingSeparator(String),

    #[error("rating key '{0}' has no valid occurrence index after its first separator")]
    InvalidIndex(String),

    #[error("rating key '{0}' has an empty skill name")]
    EmptyName(String),
}

impl RatingKey {
    pub fn new(skill_name: impl Into<String>, occurrence_index: usize) -> Self {
        Self {
            skill_name: skill_name.into(),
            occurrence_index,
        }
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}",
            self.skill_name, self.occurrence_index
        )
    }
}

/// Splits at the FIRST separator. A skill name that itself contains the separator
/// therefore leaves a non-numeric remainder and is reported as `InvalidIndex`
/// instead of being truncated into a different skill.
impl FromStr for RatingKey {
    type Err = RatingKeyError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let (name, index) = key
            .split_once(KEY_SEPARATOR)
            .ok_or_else(|| RatingKeyError::MissingSeparator(key.to_string()))?;
        if name.trim().is_empty() {
            return Err(RatingKeyError::EmptyName(key.to_string()));
        }
        let occurrence_index = index
            .parse::<usize>()
            .map_err(|_| RatingKeyError::InvalidIndex(key.to_string()))?;
        Ok(RatingKey::new(name, occurrence_index))
    }
}

impl Serialize for RatingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RatingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ratings and preferences
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRating {
    pub skill_name: String,
    pub occurrence_index: usize,
    pub raw_value: u8,
    pub level: Level,
}

impl SkillRating {
    /// The level is always derived from the value; callers cannot set it.
    pub fn new(key: RatingKey, raw_value: u8) -> Self {
        Self {
            skill_name: key.skill_name,
            occurrence_index: key.occurrence_index,
            raw_value,
            level: level_of(raw_value as i64),
        }
    }
}

/// Weekly time the user can put into learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeCommitment {
    Light,
    Moderate,
    Intensive,
}

impl TimeCommitment {
    pub fn describe(&self) -> &'static str {
        match self {
            TimeCommitment::Light => "light (under 5 hours per week)",
            TimeCommitment::Moderate => "moderate (5-15 hours per week)",
            TimeCommitment::Intensive => "intensive (15+ hours per week)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Freelance,
    Internship,
}

impl JobType {
    pub fn describe(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Freelance => "freelance",
            JobType::Internship => "internship",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub career_areas: Vec<String>,
    pub time_commitment: TimeCommitment,
    pub job_type: JobType,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferencesError {
    #[error("at most 3 career areas may be chosen, got {0}")]
    TooManyCareerAreas(usize),
}

impl Preferences {
    /// Trims and de-duplicates (case-insensitively) the career areas, keeping the
    /// first spelling seen, then enforces the three-area limit.
    pub fn sanitized(mut self) -> Result<Self, PreferencesError> {
        let mut seen: Vec<String> = Vec::new();
        let mut areas = Vec::new();
        for area in self.career_areas.drain(..) {
            let trimmed = area.trim();
            if trimmed.is_empty() {
                continue;
            }
            let folded = trimmed.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            seen.push(folded);
            areas.push(trimmed.to_string());
        }
        if areas.len() > MAX_CAREER_AREAS {
            return Err(PreferencesError::TooManyCareerAreas(areas.len()));
        }
        self.career_areas = areas;
        Ok(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

/// The normalized aggregate handed to analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentProfile {
    pub skills: Vec<SkillRating>,
    pub preferences: Option<Preferences>,
    /// `None` when no skills were rated; never a zero stand-in.
    pub average_proficiency: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unparsed_keys: Vec<String>,
}

impl AssessmentProfile {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Skills ordered by rating, highest first. Ties keep their original order.
    pub fn ranked_skills(&self) -> Vec<&SkillRating> {
        let mut ranked: Vec<&SkillRating> = self.skills.iter().collect();
        ranked.sort_by(|a, b| b.raw_value.cmp(&a.raw_value));
        ranked
    }
}
