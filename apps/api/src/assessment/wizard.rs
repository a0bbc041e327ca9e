//! Assessment State Machine: drives one user through the wizard stages.
//!
//! Flow: Intro → Preferences → SkillSelection → ProficiencyRating → SkillsSummary → Results
//!
//! Forward moves are gated by the current stage's completeness predicate. A gate
//! that does not hold is reported as `Transition::Blocked`, which is ordinary form
//! feedback, not an error. `Results` is terminal and freezes the profile.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assessment::models::{
    AssessmentProfile, Preferences, PreferencesError, RatingKey, SkillRating, KEY_SEPARATOR,
};
use crate::assessment::normalizer::normalize;
use crate::assessment::proficiency::clamp_raw;

// ────────────────────────────────────────────────────────────────────────────
// Stages and progress
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intro,
    Preferences,
    SkillSelection,
    ProficiencyRating,
    SkillsSummary,
    Results,
}

impl Stage {
    pub const ORDER: [Stage; 6] = [
        Stage::Intro,
        Stage::Preferences,
        Stage::SkillSelection,
        Stage::ProficiencyRating,
        Stage::SkillsSummary,
        Stage::Results,
    ];

    pub fn index(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<Stage> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }

    /// (floor, ceiling) progress for the stage. Only ProficiencyRating spans a
    /// range; every band starts at or above the previous stage's ceiling.
    pub fn progress_band(&self) -> (u8, u8) {
        match self {
            Stage::Intro => (0, 0),
            Stage::Preferences => (15, 15),
            Stage::SkillSelection => (30, 30),
            Stage::ProficiencyRating => (35, 80),
            Stage::SkillsSummary => (90, 90),
            Stage::Results => (100, 100),
        }
    }
}

/// Why a forward (or backward) move did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum BlockedReason {
    NoSkillsSelected,
    UnratedSkills { remaining: usize },
    AtTerminalStage,
    AtInitialStage,
}

impl BlockedReason {
    pub fn message(&self) -> String {
        match self {
            BlockedReason::NoSkillsSelected => {
                "Select at least one skill to continue.".to_string()
            }
            BlockedReason::UnratedSkills { remaining } => {
                format!("Rate the remaining {remaining} skill(s) to continue.")
            }
            BlockedReason::AtTerminalStage => "The assessment is already complete.".to_string(),
            BlockedReason::AtInitialStage => "Already at the first step.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Transition {
    Advanced { from: Stage, to: Stage },
    Blocked { reason: BlockedReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("{action} is only allowed during the {expected:?} stage (current: {actual:?})")]
    WrongStage {
        action: &'static str,
        expected: Stage,
        actual: Stage,
    },

    #[error("Invalid preferences: {0}")]
    InvalidPreferences(#[from] PreferencesError),

    #[error("Invalid skill name '{0}': names must be non-empty and must not contain '::'")]
    InvalidSkillName(String),

    #[error("'{0}' is not one of the selected skills")]
    UnknownRatingKey(String),

    #[error("'{0}' has already been rated")]
    AlreadyRated(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Wizard
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Wizard {
    stage: Stage,
    preferences: Option<Preferences>,
    selected: Vec<RatingKey>,
    ratings: HashMap<RatingKey, SkillRating>,
    frozen: Option<AssessmentProfile>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            stage: Stage::Intro,
            preferences: None,
            selected: Vec::new(),
            ratings: HashMap::new(),
            frozen: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }

    pub fn selected(&self) -> &[RatingKey] {
        &self.selected
    }

    pub fn rating(&self, key: &RatingKey) -> Option<&SkillRating> {
        self.ratings.get(key)
    }

    /// The profile frozen on entry to `Results`.
    pub fn frozen_profile(&self) -> Option<&AssessmentProfile> {
        self.frozen.as_ref()
    }

    fn rated_count(&self) -> usize {
        self.selected
            .iter()
            .filter(|k| self.ratings.contains_key(*k))
            .count()
    }

    /// Overall progress in [0, 100]. Inside ProficiencyRating it moves with the
    /// fraction of selected skills rated.
    pub fn progress(&self) -> u8 {
        let (floor, ceiling) = self.stage.progress_band();
        if self.stage != Stage::ProficiencyRating || self.selected.is_empty() {
            return floor;
        }
        let fraction = self.rated_count() as f64 / self.selected.len() as f64;
        let span = (ceiling - floor) as f64;
        floor + (span * fraction).floor() as u8
    }

    /// Completeness predicate for leaving the current stage forwards.
    pub fn blocked_reason(&self) -> Option<BlockedReason> {
        match self.stage {
            Stage::Intro | Stage::Preferences => None,
            Stage::SkillSelection => self
                .selected
                .is_empty()
                .then_some(BlockedReason::NoSkillsSelected),
            Stage::ProficiencyRating | Stage::SkillsSummary => {
                if self.selected.is_empty() {
                    return Some(BlockedReason::NoSkillsSelected);
                }
                let remaining = self.selected.len() - self.rated_count();
                (remaining > 0).then_some(BlockedReason::UnratedSkills { remaining })
            }
            Stage::Results => Some(BlockedReason::AtTerminalStage),
        }
    }

    pub fn advance(&mut self) -> Transition {
        if let Some(reason) = self.blocked_reason() {
            return Transition::Blocked { reason };
        }
        let Some(to) = self.stage.next() else {
            return Transition::Blocked {
                reason: BlockedReason::AtTerminalStage,
            };
        };
        if to == Stage::Results {
            self.frozen = Some(self.summary());
        }
        let from = self.stage;
        self.stage = to;
        Transition::Advanced { from, to }
    }

    /// User-initiated step back. Not available from the first or the terminal stage.
    pub fn back(&mut self) -> Transition {
        if self.stage == Stage::Results {
            return Transition::Blocked {
                reason: BlockedReason::AtTerminalStage,
            };
        }
        let Some(to) = self.stage.previous() else {
            return Transition::Blocked {
                reason: BlockedReason::AtInitialStage,
            };
        };
        let from = self.stage;
        self.stage = to;
        Transition::Advanced { from, to }
    }

    fn require_stage(&self, action: &'static str, expected: Stage) -> Result<(), WizardError> {
        if self.stage != expected {
            return Err(WizardError::WrongStage {
                action,
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    pub fn set_preferences(
        &mut self,
        preferences: Option<Preferences>,
    ) -> Result<(), WizardError> {
        self.require_stage("Setting preferences", Stage::Preferences)?;
        self.preferences = preferences.map(Preferences::sanitized).transpose()?;
        Ok(())
    }

    /// Replaces the selection. Repeated names get increasing occurrence indices in
    /// the order given. Ratings for skills that are no longer selected are dropped.
    pub fn select_skills(&mut self, names: Vec<String>) -> Result<&[RatingKey], WizardError> {
        self.require_stage("Selecting skills", Stage::SkillSelection)?;

        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if name.is_empty() || name.contains(KEY_SEPARATOR) {
                return Err(WizardError::InvalidSkillName(name.to_string()));
            }
            let count = occurrences.entry(name.to_string()).or_insert(0);
            selected.push(RatingKey::new(name, *count));
            *count += 1;
        }

        self.ratings.retain(|key, _| selected.contains(key));
        self.selected = selected;
        Ok(&self.selected)
    }

    pub fn submit_rating(
        &mut self,
        key: &RatingKey,
        value: f64,
    ) -> Result<&SkillRating, WizardError> {
        self.require_stage("Rating a skill", Stage::ProficiencyRating)?;
        if !self.selected.contains(key) {
            return Err(WizardError::UnknownRatingKey(key.to_string()));
        }
        if self.ratings.contains_key(key) {
            return Err(WizardError::AlreadyRated(key.to_string()));
        }
        let rating = SkillRating::new(key.clone(), clamp_raw(value));
        Ok(self.ratings.entry(key.clone()).or_insert(rating))
    }

    /// Normalized view of what has been rated so far, in selection order.
    pub fn summary(&self) -> AssessmentProfile {
        let ratings = self.selected.iter().filter_map(|key| {
            self.ratings
                .get(key)
                .map(|r| (key.to_string(), r.raw_value as f64))
        });
        normalize(ratings, self.preferences.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::models::{JobType, TimeCommitment};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn wizard_at_rating(skills: &[&str]) -> Wizard {
        let mut wizard = Wizard::new();
        wizard.advance();
        wizard.advance();
        wizard.select_skills(names(skills)).unwrap();
        assert!(matches!(wizard.advance(), Transition::Advanced { .. }));
        wizard
    }

    #[test]
    fn test_starts_at_intro_with_zero_progress() {
        let wizard = Wizard::new();
        assert_eq!(wizard.stage(), Stage::Intro);
        assert_eq!(wizard.progress(), 0);
    }

    #[test]
    fn test_zero_skills_blocks_selection_and_caps_progress() {
        let mut wizard = Wizard::new();
        wizard.advance();
        wizard.advance();
        wizard.select_skills(vec![]).unwrap();

        let transition = wizard.advance();
        assert_eq!(
            transition,
            Transition::Blocked {
                reason: BlockedReason::NoSkillsSelected
            }
        );
        assert_eq!(wizard.stage(), Stage::SkillSelection);
        assert_eq!(wizard.progress(), Stage::SkillSelection.progress_band().1);
    }

    #[test]
    fn test_rating_gate_requires_every_skill() {
        let mut wizard = wizard_at_rating(&["React", "SQL"]);
        wizard
            .submit_rating(&RatingKey::new("React", 0), 90.0)
            .unwrap();

        assert_eq!(
            wizard.advance(),
            Transition::Blocked {
                reason: BlockedReason::UnratedSkills { remaining: 1 }
            }
        );
        assert_eq!(wizard.stage(), Stage::ProficiencyRating);

        wizard.submit_rating(&RatingKey::new("SQL", 0), 20.0).unwrap();
        assert_eq!(
            wizard.advance(),
            Transition::Advanced {
                from: Stage::ProficiencyRating,
                to: Stage::SkillsSummary
            }
        );
    }

    #[test]
    fn test_progress_moves_within_rating_stage() {
        let mut wizard = wizard_at_rating(&["A", "B", "C", "D"]);
        assert_eq!(wizard.progress(), 35);
        wizard.submit_rating(&RatingKey::new("A", 0), 50.0).unwrap();
        let quarter = wizard.progress();
        assert!(quarter > 35 && quarter < 80, "progress was {quarter}");
        for name in ["B", "C", "D"] {
            wizard.submit_rating(&RatingKey::new(name, 0), 50.0).unwrap();
        }
        assert_eq!(wizard.progress(), 80);
    }

    #[test]
    fn test_progress_never_decreases_on_forward_transitions() {
        let mut wizard = Wizard::new();
        let mut last = wizard.progress();
        let mut step = |wizard: &mut Wizard| {
            wizard.advance();
            let now = wizard.progress();
            assert!(now >= last, "progress went from {last} to {now}");
            last = now;
        };
        step(&mut wizard);
        step(&mut wizard);
        wizard.select_skills(names(&["Go"])).unwrap();
        step(&mut wizard);
        wizard.submit_rating(&RatingKey::new("Go", 0), 70.0).unwrap();
        step(&mut wizard);
        step(&mut wizard);
        assert_eq!(wizard.stage(), Stage::Results);
        assert_eq!(wizard.progress(), 100);
    }

    #[test]
    fn test_results_is_terminal_and_freezes_profile() {
        let mut wizard = wizard_at_rating(&["React", "SQL"]);
        wizard.submit_rating(&RatingKey::new("React", 0), 90.0).unwrap();
        wizard.submit_rating(&RatingKey::new("SQL", 0), 20.0).unwrap();
        wizard.advance();
        assert!(wizard.frozen_profile().is_none());
        wizard.advance();

        let frozen = wizard.frozen_profile().unwrap();
        assert_eq!(frozen.skills.len(), 2);
        assert_eq!(frozen.average_proficiency, Some(55.0));

        assert_eq!(
            wizard.advance(),
            Transition::Blocked {
                reason: BlockedReason::AtTerminalStage
            }
        );
        assert_eq!(
            wizard.back(),
            Transition::Blocked {
                reason: BlockedReason::AtTerminalStage
            }
        );
    }

    #[test]
    fn test_back_from_intro_is_blocked() {
        let mut wizard = Wizard::new();
        assert_eq!(
            wizard.back(),
            Transition::Blocked {
                reason: BlockedReason::AtInitialStage
            }
        );
    }

    #[test]
    fn test_back_then_reselect_drops_stale_ratings() {
        let mut wizard = wizard_at_rating(&["React", "SQL"]);
        wizard.submit_rating(&RatingKey::new("React", 0), 90.0).unwrap();
        wizard.submit_rating(&RatingKey::new("SQL", 0), 20.0).unwrap();

        wizard.back();
        assert_eq!(wizard.stage(), Stage::SkillSelection);
        wizard.select_skills(names(&["React", "Go"])).unwrap();
        assert!(wizard.rating(&RatingKey::new("React", 0)).is_some());
        assert!(wizard.rating(&RatingKey::new("SQL", 0)).is_none());

        wizard.advance();
        assert_eq!(
            wizard.blocked_reason(),
            Some(BlockedReason::UnratedSkills { remaining: 1 })
        );
    }

    #[test]
    fn test_repeated_names_get_occurrence_indices() {
        let mut wizard = Wizard::new();
        wizard.advance();
        wizard.advance();
        let selected = wizard
            .select_skills(names(&["Python", "SQL", " Python "]))
            .unwrap()
            .to_vec();
        assert_eq!(
            selected,
            vec![
                RatingKey::new("Python", 0),
                RatingKey::new("SQL", 0),
                RatingKey::new("Python", 1)
            ]
        );
    }

    #[test]
    fn test_invalid_skill_names_are_rejected() {
        let mut wizard = Wizard::new();
        wizard.advance();
        wizard.advance();
        assert!(matches!(
            wizard.select_skills(names(&["  "])),
            Err(WizardError::InvalidSkillName(_))
        ));
        assert!(matches!(
            wizard.select_skills(names(&["std::io"])),
            Err(WizardError::InvalidSkillName(_))
        ));
    }

    #[test]
    fn test_rating_is_immutable_once_submitted() {
        let mut wizard = wizard_at_rating(&["React"]);
        let key = RatingKey::new("React", 0);
        wizard.submit_rating(&key, 40.0).unwrap();
        assert_eq!(
            wizard.submit_rating(&key, 95.0).unwrap_err(),
            WizardError::AlreadyRated("React::0".to_string())
        );
        assert_eq!(wizard.rating(&key).unwrap().raw_value, 40);
    }

    #[test]
    fn test_unknown_rating_key_is_rejected() {
        let mut wizard = wizard_at_rating(&["React"]);
        assert!(matches!(
            wizard.submit_rating(&RatingKey::new("React", 1), 40.0),
            Err(WizardError::UnknownRatingKey(_))
        ));
    }

    #[test]
    fn test_mutations_outside_their_stage_are_rejected() {
        let mut wizard = Wizard::new();
        assert!(matches!(
            wizard.select_skills(names(&["Go"])),
            Err(WizardError::WrongStage {
                expected: Stage::SkillSelection,
                actual: Stage::Intro,
                ..
            })
        ));
        assert!(matches!(
            wizard.submit_rating(&RatingKey::new("Go", 0), 10.0),
            Err(WizardError::WrongStage { .. })
        ));
        assert!(matches!(
            wizard.set_preferences(None),
            Err(WizardError::WrongStage { .. })
        ));
    }

    #[test]
    fn test_preferences_are_optional_and_validated() {
        let mut wizard = Wizard::new();
        wizard.advance();
        wizard.set_preferences(None).unwrap();
        assert!(wizard.preferences().is_none());

        let too_many = Preferences {
            career_areas: names(&["a", "b", "c", "d"]),
            time_commitment: TimeCommitment::Light,
            job_type: JobType::FullTime,
        };
        assert!(matches!(
            wizard.set_preferences(Some(too_many)),
            Err(WizardError::InvalidPreferences(_))
        ));

        assert!(matches!(wizard.advance(), Transition::Advanced { .. }));
    }

    #[test]
    fn test_transition_serializes_with_outcome_tag() {
        let blocked = Transition::Blocked {
            reason: BlockedReason::UnratedSkills { remaining: 2 },
        };
        let json = serde_json::to_value(&blocked).unwrap();
        assert_eq!(json["outcome"], "blocked");
        assert_eq!(json["reason"]["code"], "unrated_skills");
        assert_eq!(json["reason"]["remaining"], 2);
    }
}
