//! Structured-Output Extractor: recovers an `AnalysisResult` from free-text model output.
//!
//! Model replies are untrusted input. Nothing here panics or propagates an error
//! upward: every way the text can be wrong ends as an `ExtractionFailure` value
//! that still carries the raw reply for diagnostics.
//!
//! Candidates are tried in this order:
//!   1. the body of every fenced block labelled `json`
//!   2. the first top-level balanced `{ … }` span in the whole reply
//! The first candidate that parses as a JSON object is validated; later
//! candidates are not consulted after that.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::models::{
    AnalysisResult, CareerMatch, Demand, LearningStep, Priority, SkillsAnalysis,
};

lazy_static! {
    static ref JSON_FENCE: Regex =
        Regex::new(r"(?is)```[ \t]*json[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid");
}

/// Scores this far outside [0, 100] are treated as nonsense rather than clamped.
const SCORE_TOLERANCE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("No JSON object found in model output")]
    NoJsonFound,

    #[error("Malformed JSON: {0}")]
    Malformed(String),

    #[error("JSON does not match the analysis shape: {0}")]
    InvalidShape(String),
}

#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct ExtractionFailure {
    pub error: ExtractionError,
    pub raw: String,
}

pub fn extract(raw: &str) -> Result<AnalysisResult, ExtractionFailure> {
    extract_inner(raw).map_err(|error| ExtractionFailure {
        error,
        raw: raw.to_string(),
    })
}

fn extract_inner(raw: &str) -> Result<AnalysisResult, ExtractionError> {
    let mut candidates: Vec<&str> = JSON_FENCE
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect();

    let mut last_parse_error = None;
    match first_balanced_object(raw) {
        BraceScan::Balanced(span) => candidates.push(span),
        BraceScan::Unterminated => {
            last_parse_error = Some("unterminated JSON object".to_string());
        }
        BraceScan::NotFound => {}
    }

    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(obj)) => return validate(&obj),
            Ok(_) => continue,
            Err(e) => last_parse_error = Some(e.to_string()),
        }
    }

    Err(match last_parse_error {
        Some(reason) => ExtractionError::Malformed(reason),
        None => ExtractionError::NoJsonFound,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Balanced-brace scan
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum BraceScan<'a> {
    Balanced(&'a str),
    Unterminated,
    NotFound,
}

/// Finds the first `{` and the `}` that closes it. Braces inside JSON strings
/// (including escaped quotes) do not count.
fn first_balanced_object(text: &str) -> BraceScan<'_> {
    let Some(start) = text.find('{') else {
        return BraceScan::NotFound;
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return BraceScan::Balanced(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    BraceScan::Unterminated
}

// ────────────────────────────────────────────────────────────────────────────
// Shape validation
// ────────────────────────────────────────────────────────────────────────────

type Shape<T> = Result<T, ExtractionError>;

fn invalid(path: &str, what: &str) -> ExtractionError {
    ExtractionError::InvalidShape(format!("{path}: {what}"))
}

fn validate(obj: &Map<String, Value>) -> Shape<AnalysisResult> {
    let career_matches = non_empty_array(obj, "careerMatches", "careerMatches")?
        .iter()
        .enumerate()
        .map(|(i, v)| career_match(v, &format!("careerMatches[{i}]")))
        .collect::<Shape<Vec<_>>>()?;

    let skills_obj = object(obj, "skillsAnalysis", "skillsAnalysis")?;
    let skills_analysis = SkillsAnalysis {
        strengths: string_list(skills_obj, "strengths", "skillsAnalysis.strengths")?,
        improvements: string_list(skills_obj, "improvements", "skillsAnalysis.improvements")?,
        market_alignment: score(
            skills_obj,
            "marketAlignment",
            "skillsAnalysis.marketAlignment",
        )?,
    };

    let learning_path = non_empty_array(obj, "learningPath", "learningPath")?
        .iter()
        .enumerate()
        .map(|(i, v)| learning_step(v, &format!("learningPath[{i}]")))
        .collect::<Shape<Vec<_>>>()?;

    Ok(AnalysisResult {
        career_matches,
        skills_analysis,
        learning_path,
    })
}

fn career_match(value: &Value, path: &str) -> Shape<CareerMatch> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid(path, "expected an object"))?;
    Ok(CareerMatch {
        title: non_blank_string(obj, "title", &format!("{path}.title"))?,
        match_score: score(obj, "matchScore", &format!("{path}.matchScore"))?,
        demand: demand(obj, &format!("{path}.demand"))?,
        salary_range: string(obj, "salaryRange", &format!("{path}.salaryRange"))?,
        required_skills: string_list(obj, "requiredSkills", &format!("{path}.requiredSkills"))?,
        reasoning: string(obj, "reasoning", &format!("{path}.reasoning"))?,
    })
}

fn learning_step(value: &Value, path: &str) -> Shape<LearningStep> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid(path, "expected an object"))?;
    Ok(LearningStep {
        skill: non_blank_string(obj, "skill", &format!("{path}.skill"))?,
        priority: priority(obj, &format!("{path}.priority"))?,
        estimated_time: string(obj, "estimatedTime", &format!("{path}.estimatedTime"))?,
        resources: string_list(obj, "resources", &format!("{path}.resources"))?,
    })
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Shape<&'a Value> {
    obj.get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| invalid(path, "missing"))
}

fn object<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Shape<&'a Map<String, Value>> {
    field(obj, key, path)?
        .as_object()
        .ok_or_else(|| invalid(path, "expected an object"))
}

fn non_empty_array<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Shape<&'a Vec<Value>> {
    let items = field(obj, key, path)?
        .as_array()
        .ok_or_else(|| invalid(path, "expected an array"))?;
    if items.is_empty() {
        return Err(invalid(path, "must not be empty"));
    }
    Ok(items)
}

fn string(obj: &Map<String, Value>, key: &str, path: &str) -> Shape<String> {
    field(obj, key, path)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(path, "expected a string"))
}

fn non_blank_string(obj: &Map<String, Value>, key: &str, path: &str) -> Shape<String> {
    let s = string(obj, key, path)?;
    if s.trim().is_empty() {
        return Err(invalid(path, "must not be blank"));
    }
    Ok(s)
}

fn string_list(obj: &Map<String, Value>, key: &str, path: &str) -> Shape<Vec<String>> {
    non_empty_array(obj, key, path)?
        .iter()
        .enumerate()
        .map(|(i, v)| match v.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
            Some(_) => Err(invalid(&format!("{path}[{i}]"), "must not be blank")),
            None => Err(invalid(&format!("{path}[{i}]"), "expected a string")),
        })
        .collect()
}

fn score(obj: &Map<String, Value>, key: &str, path: &str) -> Shape<u8> {
    let n = field(obj, key, path)?
        .as_f64()
        .ok_or_else(|| invalid(path, "expected a number"))?;
    clamp_score(n).ok_or_else(|| invalid(path, &format!("score {n} is out of range")))
}

fn clamp_score(n: f64) -> Option<u8> {
    if !n.is_finite() || n < -SCORE_TOLERANCE || n > 100.0 + SCORE_TOLERANCE {
        return None;
    }
    Some(n.round().clamp(0.0, 100.0) as u8)
}

/// Lowercases and drops everything that is not a letter or digit, so
/// "Very High", "very_high" and "VeryHigh" compare equal.
fn enum_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn demand(obj: &Map<String, Value>, path: &str) -> Shape<Demand> {
    let raw = string(obj, "demand", path)?;
    match enum_token(&raw).as_str() {
        "low" => Ok(Demand::Low),
        "medium" => Ok(Demand::Medium),
        "high" => Ok(Demand::High),
        "veryhigh" => Ok(Demand::VeryHigh),
        _ => Err(invalid(path, &format!("unknown demand '{raw}'"))),
    }
}

fn priority(obj: &Map<String, Value>, path: &str) -> Shape<Priority> {
    let raw = string(obj, "priority", path)?;
    match enum_token(&raw).as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        _ => Err(invalid(path, &format!("unknown priority '{raw}'"))),
    }
}
