// All LLM prompt constants for the Analysis module.
// Reuses cross-cutting fragments from llm_client::prompts.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::assessment::models::{AssessmentProfile, Preferences};
use crate::llm_client::prompts::{JSON_OBJECT_SYSTEM, SCHEMA_INSTRUCTION};

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{(skills|average|preferences|schema_instruction)\}")
            .expect("placeholder pattern is valid");
}

/// System prompt for career analysis.
pub const ANALYSIS_SYSTEM: &str = "You are an experienced career advisor and labour-market analyst. \
    You recommend realistic career paths from a person's self-assessed skills. \
    Be specific and honest about gaps.";

/// Career analysis prompt template.
/// Replace: {skills}, {average}, {preferences}, {schema_instruction}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this person's skill self-assessment and recommend careers.

SKILLS (self-rated proficiency, 0-100%):
{skills}

AVERAGE PROFICIENCY: {average}

PREFERENCES:
{preferences}

Return a single JSON object with this EXACT schema (no extra fields). You may wrap it in a ```json code block:
{
  "careerMatches": [
    {
      "title": "Frontend Developer",
      "matchScore": 85,
      "demand": "High",
      "salaryRange": "$70,000 - $110,000",
      "requiredSkills": ["React", "TypeScript"],
      "reasoning": "Why this career fits the ratings above"
    }
  ],
  "skillsAnalysis": {
    "strengths": ["React"],
    "improvements": ["SQL"],
    "marketAlignment": 75
  },
  "learningPath": [
    {
      "skill": "SQL",
      "priority": "High",
      "estimatedTime": "4-6 weeks",
      "resources": ["A specific course, book or project"]
    }
  ]
}

ENUM VALUES:
- demand: "Low" | "Medium" | "High" | "VeryHigh"
- priority: "Low" | "Medium" | "High"

{schema_instruction}

Recommend 3 to 5 careers ordered by matchScore. Base strengths and improvements on the ratings above."#;

/// Full system instruction sent with every analysis request.
pub fn analysis_system() -> String {
    format!("{ANALYSIS_SYSTEM} {JSON_OBJECT_SYSTEM}")
}

/// Renders the analysis prompt. Every skill is listed with its percentage and
/// level; preferences are stated verbatim or as "not specified".
pub fn render_analysis_prompt(profile: &AssessmentProfile) -> String {
    let skills = if profile.skills.is_empty() {
        "- none rated".to_string()
    } else {
        profile
            .skills
            .iter()
            .map(|s| format!("- {}: {}% ({})", s.skill_name, s.raw_value, s.level.label()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let average = profile
        .average_proficiency
        .map(|avg| format!("{avg:.1}%"))
        .unwrap_or_else(|| "not available".to_string());

    let preferences = render_preferences(profile.preferences.as_ref());

    // One pass over the template: user text is never rescanned for placeholders.
    PLACEHOLDER
        .replace_all(ANALYSIS_PROMPT_TEMPLATE, |caps: &Captures| match &caps[1] {
            "skills" => skills.clone(),
            "average" => average.clone(),
            "preferences" => preferences.clone(),
            _ => SCHEMA_INSTRUCTION.to_string(),
        })
        .into_owned()
}

fn render_preferences(preferences: Option<&Preferences>) -> String {
    let Some(prefs) = preferences else {
        return "- Career areas: not specified\n- Time commitment: not specified\n- Job type: not specified"
            .to_string();
    };
    let areas = if prefs.career_areas.is_empty() {
        "not specified".to_string()
    } else {
        prefs.career_areas.join(", ")
    };
    format!(
        "- Career areas: {areas}\n- Time commitment: {}\n- Job type: {}",
        prefs.time_commitment.describe(),
        prefs.job_type.describe()
    )
}
