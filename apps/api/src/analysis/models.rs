use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm_client::ProviderKind;

// ────────────────────────────────────────────────────────────────────────────
// AnalysisResult: provider-independent output contract.
// Field names are camelCase because this is the exact shape the prompt asks
// the model to produce.
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Demand {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerMatch {
    pub title: String,
    /// 0 – 100
    pub match_score: u8,
    pub demand: Demand,
    pub salary_range: String,
    pub required_skills: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsAnalysis {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// 0 – 100
    pub market_alignment: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStep {
    pub skill: String,
    pub priority: Priority,
    pub estimated_time: String,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub career_matches: Vec<CareerMatch>,
    pub skills_analysis: SkillsAnalysis,
    pub learning_path: Vec<LearningStep>,
}

impl AnalysisResult {
    /// Every list (top-level and nested) is non-empty. Scores are `u8` and are
    /// clamped on construction, so only their upper bound needs checking.
    pub fn is_well_formed(&self) -> bool {
        let matches_ok = !self.career_matches.is_empty()
            && self.career_matches.iter().all(|m| {
                !m.title.trim().is_empty() && !m.required_skills.is_empty() && m.match_score <= 100
            });
        let skills_ok = !self.skills_analysis.strengths.is_empty()
            && !self.skills_analysis.improvements.is_empty()
            && self.skills_analysis.market_alignment <= 100;
        let path_ok = !self.learning_path.is_empty()
            && self
                .learning_path
                .iter()
                .all(|s| !s.skill.trim().is_empty() && !s.resources.is_empty());
        matches_ok && skills_ok && path_ok
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provenance
// ────────────────────────────────────────────────────────────────────────────

/// Which code path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducedBy {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Fallback,
}

impl From<ProviderKind> for ProducedBy {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Anthropic => ProducedBy::Anthropic,
            ProviderKind::OpenAi => ProducedBy::OpenAi,
        }
    }
}

/// Why the fallback path was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    NoProviderConfigured,
    ProviderCallFailed,
    ProviderTimedOut,
    ExtractionFailed,
}

/// One analysis outcome. Created once per request and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenancedResult {
    pub analysis_id: Uuid,
    pub result: AnalysisResult,
    pub produced_by: ProducedBy,
    /// Provider reply, kept for diagnostics whenever a provider answered.
    pub raw: Option<String>,
    pub fallback_reason: Option<FallbackReason>,
    pub generated_at: DateTime<Utc>,
}

impl ProvenancedResult {
    pub fn from_provider(provider: ProviderKind, result: AnalysisResult, raw: String) -> Self {
        debug_assert!(result.is_well_formed());
        Self {
            analysis_id: Uuid::new_v4(),
            result,
            produced_by: provider.into(),
            raw: Some(raw),
            fallback_reason: None,
            generated_at: Utc::now(),
        }
    }

    pub fn fallback(result: AnalysisResult, reason: FallbackReason, raw: Option<String>) -> Self {
        debug_assert!(result.is_well_formed());
        Self {
            analysis_id: Uuid::new_v4(),
            result,
            produced_by: ProducedBy::Fallback,
            raw,
            fallback_reason: Some(reason),
            generated_at: Utc::now(),
        }
    }

    pub fn is_ai_enhanced(&self) -> bool {
        self.produced_by != ProducedBy::Fallback
    }
}
