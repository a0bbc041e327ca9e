//! Profile Normalizer: reduces raw `rating key → slider value` pairs into the
//! canonical `AssessmentProfile` sent to analysis.

use std::collections::HashSet;

use tracing::warn;

use crate::assessment::models::{AssessmentProfile, Preferences, RatingKey, SkillRating};
use crate::assessment::proficiency::clamp_raw;

/// Builds a profile from ratings in the caller's iteration order.
///
/// - keys are split at their first `::`; keys that do not split cleanly are listed
///   in `unparsed_keys` rather than guessed at
/// - duplicate keys keep the first rating (ratings are immutable once given)
/// - an empty input yields `average_proficiency = None`
pub fn normalize<I, K>(ratings: I, preferences: Option<Preferences>) -> AssessmentProfile
where
    I: IntoIterator<Item = (K, f64)>,
    K: AsRef<str>,
{
    let mut seen: HashSet<RatingKey> = HashSet::new();
    let mut skills = Vec::new();
    let mut unparsed_keys = Vec::new();

    for (raw_key, value) in ratings {
        let raw_key = raw_key.as_ref();
        let key = match raw_key.parse::<RatingKey>() {
            Ok(key) => key,
            Err(e) => {
                warn!("Skipping rating with unparseable key: {e}");
                unparsed_keys.push(raw_key.to_string());
                continue;
            }
        };
        if !seen.insert(key.clone()) {
            continue;
        }
        skills.push(SkillRating::new(key, clamp_raw(value)));
    }

    let average_proficiency = average(&skills);

    AssessmentProfile {
        skills,
        preferences,
        average_proficiency,
        unparsed_keys,
    }
}

/// Arithmetic mean of the raw values; `None` for an empty list.
pub fn average(skills: &[SkillRating]) -> Option<f64> {
    if skills.is_empty() {
        return None;
    }
    let sum: f64 = skills.iter().map(|s| s.raw_value as f64).sum();
    Some(sum / skills.len() as f64)
}
