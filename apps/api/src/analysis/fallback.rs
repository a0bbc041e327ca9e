//! Fallback Synthesizer: builds a schema-valid `AnalysisResult` from the profile
//! alone, with no network access. Used whenever the provider path cannot
//! produce a result. Deterministic: the same profile always yields the same result.

use crate::analysis::career_tracks::{CareerTrack, CAREER_TRACKS};
use crate::analysis::models::{
    AnalysisResult, CareerMatch, Demand, LearningStep, Priority, SkillsAnalysis,
};
use crate::assessment::models::{AssessmentProfile, Preferences, SkillRating};
use crate::assessment::normalizer::average;
use crate::assessment::proficiency::{clamp_raw, Level};

const MAX_CAREER_MATCHES: usize = 3;
const MAX_LEARNING_STEPS: usize = 5;
const MAX_REQUIRED_SKILLS: usize = 6;

/// Fallback match scores stay inside this band; they are estimates, not model output.
const MIN_MATCH_SCORE: u8 = 55;
const MATCH_SCORE_SPAN: f64 = 20.0;

pub fn synthesize(profile: &AssessmentProfile) -> AnalysisResult {
    if profile.is_empty() {
        return exploration(profile.preferences.as_ref());
    }

    let ranked = profile.ranked_skills();
    let mean = average(&profile.skills).unwrap_or(0.0);
    let best = best_per_skill(&ranked);

    let strengths = unique_names(ranked.iter().filter(|s| f64::from(s.raw_value) >= mean));
    let mut improvements =
        unique_names(ranked.iter().rev().filter(|s| f64::from(s.raw_value) < mean));
    if improvements.is_empty() {
        if let Some(lowest) = ranked.last() {
            improvements.push(lowest.skill_name.clone());
        }
    }

    let learning_path = improvements
        .iter()
        .take(MAX_LEARNING_STEPS)
        .map(|name| learning_step(name, lowest_level(profile, name)))
        .collect();

    AnalysisResult {
        career_matches: career_matches(&best, profile.preferences.as_ref()),
        skills_analysis: SkillsAnalysis {
            strengths,
            improvements,
            market_alignment: clamp_raw(mean),
        },
        learning_path,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Career matches
// ────────────────────────────────────────────────────────────────────────────

struct ScoredTrack<'a> {
    track: &'static CareerTrack,
    matched: Vec<&'a SkillRating>,
    preferred: bool,
    score: u8,
}

fn career_matches(best: &[&SkillRating], preferences: Option<&Preferences>) -> Vec<CareerMatch> {
    let mut scored: Vec<ScoredTrack> = CAREER_TRACKS
        .iter()
        .filter_map(|track| score_track(track, best, preferences))
        .collect();
    // Stable: equal scores keep table order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));

    let matches: Vec<CareerMatch> = scored
        .into_iter()
        .take(MAX_CAREER_MATCHES)
        .map(track_match)
        .collect();

    if !matches.is_empty() {
        return matches;
    }
    // No track recognises any rated skill: build one around the strongest skill.
    best.first()
        .map(|top| vec![specialist_match(top)])
        .unwrap_or_default()
}

fn score_track<'a>(
    track: &'static CareerTrack,
    best: &[&'a SkillRating],
    preferences: Option<&Preferences>,
) -> Option<ScoredTrack<'a>> {
    let matched: Vec<&SkillRating> = best
        .iter()
        .copied()
        .filter(|s| track.has_keyword(&s.skill_name))
        .collect();
    if matched.is_empty() {
        return None;
    }

    let preferred = is_preferred(track, preferences);
    let fit = matched.iter().map(|s| f64::from(s.raw_value)).sum::<f64>()
        / (matched.len() as f64 * 100.0);
    let coverage = (matched.len() as f64 / track.keywords.len().min(4) as f64).min(1.0);
    let boost = if preferred { 0.1 } else { 0.0 };
    let strength = (0.7 * fit + 0.3 * coverage + boost).min(1.0);

    Some(ScoredTrack {
        track,
        matched,
        preferred,
        score: band_score(strength),
    })
}

fn is_preferred(track: &CareerTrack, preferences: Option<&Preferences>) -> bool {
    preferences
        .map(|p| p.career_areas.iter().any(|area| track.in_area(area)))
        .unwrap_or(false)
}

/// Maps a strength in [0, 1] onto the conservative fallback score band.
fn band_score(strength: f64) -> u8 {
    MIN_MATCH_SCORE + (MATCH_SCORE_SPAN * strength.clamp(0.0, 1.0)).round() as u8
}

fn track_match(scored: ScoredTrack) -> CareerMatch {
    let mut required: Vec<String> = scored
        .matched
        .iter()
        .take(3)
        .map(|s| s.skill_name.clone())
        .collect();
    for core in scored.track.core_skills {
        if required.len() >= MAX_REQUIRED_SKILLS {
            break;
        }
        if !required.iter().any(|r| r.eq_ignore_ascii_case(core)) {
            required.push(core.to_string());
        }
    }

    let evidence = scored
        .matched
        .iter()
        .take(3)
        .map(|s| format!("{} ({})", s.skill_name, s.level.label()))
        .collect::<Vec<_>>()
        .join(", ");
    let mut reasoning = format!(
        "Builds on your {evidence} skills, which are central to {} work.",
        scored.track.title
    );
    if scored.preferred {
        reasoning.push_str(" It also falls within one of your preferred career areas.");
    }

    CareerMatch {
        title: scored.track.title.to_string(),
        match_score: scored.score,
        demand: scored.track.demand,
        salary_range: scored.track.salary_range.to_string(),
        required_skills: required,
        reasoning,
    }
}

fn specialist_match(top: &SkillRating) -> CareerMatch {
    CareerMatch {
        title: format!("{} Specialist", top.skill_name),
        match_score: band_score(f64::from(top.raw_value) / 100.0),
        demand: Demand::Medium,
        salary_range: "Varies by role and region".to_string(),
        required_skills: vec![top.skill_name.clone()],
        reasoning: format!(
            "{} is your strongest rated skill ({}); roles that specialise in it are a natural next step.",
            top.skill_name,
            top.level.label()
        ),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skills and learning path
// ────────────────────────────────────────────────────────────────────────────

/// Highest rating per skill name (case-insensitive), in rank order.
fn best_per_skill<'a>(ranked: &[&'a SkillRating]) -> Vec<&'a SkillRating> {
    let mut seen: Vec<String> = Vec::new();
    let mut best = Vec::new();
    for skill in ranked {
        let folded = skill.skill_name.to_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            best.push(*skill);
        }
    }
    best
}

fn unique_names<'a, 'b: 'a>(skills: impl Iterator<Item = &'a &'b SkillRating>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for skill in skills {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(&skill.skill_name)) {
            names.push(skill.skill_name.clone());
        }
    }
    names
}

fn lowest_level(profile: &AssessmentProfile, name: &str) -> Level {
    profile
        .skills
        .iter()
        .filter(|s| s.skill_name.eq_ignore_ascii_case(name))
        .map(|s| s.level)
        .min()
        .unwrap_or(Level::Novice)
}

fn learning_step(skill: &str, level: Level) -> LearningStep {
    let priority = match level {
        Level::Novice | Level::Beginner => Priority::High,
        Level::Intermediate => Priority::Medium,
        Level::Advanced | Level::Expert => Priority::Low,
    };
    let estimated_time = match level {
        Level::Novice => "3-4 months",
        Level::Beginner => "2-3 months",
        Level::Intermediate => "4-6 weeks",
        Level::Advanced => "2-4 weeks",
        Level::Expert => "1-2 weeks",
    };
    LearningStep {
        skill: skill.to_string(),
        priority,
        estimated_time: estimated_time.to_string(),
        resources: vec![
            format!("Official {skill} documentation and tutorials"),
            format!("A structured online course on {skill}"),
            format!("A hands-on portfolio project that uses {skill}"),
        ],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Empty profile
// ────────────────────────────────────────────────────────────────────────────

/// Generic exploration content for a profile with no rated skills. Tracks in the
/// preferred career areas are suggested when there are any.
fn exploration(preferences: Option<&Preferences>) -> AnalysisResult {
    let mut career_matches: Vec<CareerMatch> = CAREER_TRACKS
        .iter()
        .filter(|t| is_preferred(t, preferences))
        .take(MAX_CAREER_MATCHES)
        .map(|t| CareerMatch {
            title: t.title.to_string(),
            match_score: MIN_MATCH_SCORE,
            demand: t.demand,
            salary_range: t.salary_range.to_string(),
            required_skills: t.core_skills.iter().map(|s| s.to_string()).collect(),
            reasoning: "Matches a career area you are interested in. Rate your skills for a closer fit."
                .to_string(),
        })
        .collect();

    if career_matches.is_empty() {
        career_matches.push(CareerMatch {
            title: "Technology Generalist".to_string(),
            match_score: MIN_MATCH_SCORE,
            demand: Demand::Medium,
            salary_range: "Varies by role and region".to_string(),
            required_skills: vec!["Problem Solving".to_string(), "Communication".to_string()],
            reasoning: "No skills were rated yet, so this is a starting point for exploration."
                .to_string(),
        });
    }

    AnalysisResult {
        career_matches,
        skills_analysis: SkillsAnalysis {
            strengths: vec!["Willingness to explore new areas".to_string()],
            improvements: vec!["Rate your current skills to get tailored advice".to_string()],
            market_alignment: 0,
        },
        learning_path: vec![LearningStep {
            skill: "Career exploration".to_string(),
            priority: Priority::High,
            estimated_time: "1-2 weeks".to_string(),
            resources: vec![
                "Browse job postings in fields that interest you".to_string(),
                "Talk to people working in roles you find appealing".to_string(),
                "Try a short introductory course in one new area".to_string(),
            ],
        }],
    }
}
