//! Analysis Orchestrator: the one entry point the rest of the service uses.
//!
//! `analyze` never fails: dispatch, retry, extraction and fallback are folded
//! into a single `ProvenancedResult` that says which path produced it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::analysis::dispatcher::{DispatchError, Dispatched, ProviderDispatcher};
use crate::analysis::extractor::extract;
use crate::analysis::fallback::synthesize;
use crate::analysis::models::{FallbackReason, ProvenancedResult};
use crate::assessment::models::AssessmentProfile;
use crate::config::Config;
use crate::llm_client::ProviderKind;

pub struct AnalysisOrchestrator {
    dispatcher: Arc<ProviderDispatcher>,
    /// Budget for the whole provider attempt, retries and backoff included.
    timeout: Duration,
    max_retries: u32,
    default_provider: Option<ProviderKind>,
}

impl AnalysisOrchestrator {
    pub fn new(
        dispatcher: Arc<ProviderDispatcher>,
        timeout: Duration,
        max_retries: u32,
        default_provider: Option<ProviderKind>,
    ) -> Self {
        Self {
            dispatcher,
            timeout,
            max_retries,
            default_provider,
        }
    }

    pub fn from_config(dispatcher: Arc<ProviderDispatcher>, config: &Config) -> Self {
        Self::new(
            dispatcher,
            config.analysis_timeout(),
            config.analysis_max_retries,
            config.default_provider,
        )
    }

    pub fn dispatcher(&self) -> &ProviderDispatcher {
        &self.dispatcher
    }

    pub fn default_provider(&self) -> Option<ProviderKind> {
        self.default_provider
    }

    pub async fn analyze(
        &self,
        profile: &AssessmentProfile,
        preferred: Option<ProviderKind>,
    ) -> ProvenancedResult {
        let preferred = preferred.or(self.default_provider);

        let attempt = tokio::time::timeout(self.timeout, self.dispatch_with_retry(profile, preferred));
        let dispatched = match attempt.await {
            Ok(Ok(dispatched)) => dispatched,
            Ok(Err(DispatchError::NoProviderConfigured)) => {
                info!("No LLM provider configured, using fallback analysis");
                return fallback(profile, FallbackReason::NoProviderConfigured, None);
            }
            Ok(Err(e)) => {
                warn!("Provider call failed, using fallback analysis: {e}");
                return fallback(profile, FallbackReason::ProviderCallFailed, None);
            }
            Err(_) => {
                warn!(
                    "Provider call timed out after {}s, using fallback analysis",
                    self.timeout.as_secs()
                );
                return fallback(profile, FallbackReason::ProviderTimedOut, None);
            }
        };

        let Dispatched { provider, raw_text } = dispatched;
        match extract(&raw_text) {
            Ok(result) => {
                info!("Analysis produced by {provider}");
                ProvenancedResult::from_provider(provider, result, raw_text)
            }
            Err(failure) => {
                warn!("Could not extract analysis from {provider} reply: {failure}");
                fallback(profile, FallbackReason::ExtractionFailed, Some(failure.raw))
            }
        }
    }

    /// Re-dispatches retryable failures with exponential backoff (1s, 2s, 4s, ...).
    async fn dispatch_with_retry(
        &self,
        profile: &AssessmentProfile,
        preferred: Option<ProviderKind>,
    ) -> Result<Dispatched, DispatchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.dispatcher.dispatch(profile, preferred).await {
                Ok(dispatched) => return Ok(dispatched),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = Duration::from_millis(1000 * (1 << attempt.min(16)));
                    attempt += 1;
                    warn!(
                        "Analysis attempt {} failed ({e}), retrying after {}ms...",
                        attempt,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn fallback(
    profile: &AssessmentProfile,
    reason: FallbackReason,
    raw: Option<String>,
) -> ProvenancedResult {
    ProvenancedResult::fallback(synthesize(profile), reason, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::dispatcher::test_support::{Reply, ScriptedProvider};
    use crate::analysis::models::ProducedBy;
    use crate::assessment::normalizer::normalize;
    use crate::llm_client::LlmProvider;

    const VALID: &str = r#"```json
{
  "careerMatches": [{"title": "Frontend Developer", "matchScore": 90, "demand": "High",
    "salaryRange": "$80k - $120k", "requiredSkills": ["React"], "reasoning": "Expert React"}],
  "skillsAnalysis": {"strengths": ["React"], "improvements": ["SQL"], "marketAlignment": 70},
  "learningPath": [{"skill": "SQL", "priority": "High", "estimatedTime": "6 weeks",
    "resources": ["SQLBolt"]}]
}
```"#;

    fn profile() -> AssessmentProfile {
        normalize(vec![("React::0", 90.0), ("SQL::0", 20.0)], None)
    }

    fn orchestrator(providers: Vec<Arc<dyn LlmProvider>>, max_retries: u32) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(
            Arc::new(ProviderDispatcher::new(providers)),
            Duration::from_secs(45),
            max_retries,
            None,
        )
    }

    #[tokio::test]
    async fn test_no_provider_falls_back() {
        let result = orchestrator(vec![], 1).analyze(&profile(), None).await;

        assert_eq!(result.produced_by, ProducedBy::Fallback);
        assert_eq!(result.fallback_reason, Some(FallbackReason::NoProviderConfigured));
        assert!(result.raw.is_none());
        assert!(result.result.is_well_formed());
        assert!(result.result.skills_analysis.strengths.contains(&"React".to_string()));
        assert!(result.result.skills_analysis.improvements.contains(&"SQL".to_string()));
    }

    #[tokio::test]
    async fn test_valid_reply_is_attributed_to_provider() {
        let provider = Arc::new(ScriptedProvider::text(ProviderKind::OpenAi, VALID));
        let result = orchestrator(vec![provider], 1)
            .analyze(&profile(), Some(ProviderKind::Anthropic))
            .await;

        assert_eq!(result.produced_by, ProducedBy::OpenAi);
        assert!(result.fallback_reason.is_none());
        assert_eq!(result.raw.as_deref(), Some(VALID));
        assert_eq!(result.result.career_matches[0].match_score, 90);
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back_and_keeps_raw() {
        let raw = r#"{"careerMatches": [}"#;
        let provider = Arc::new(ScriptedProvider::text(ProviderKind::Anthropic, raw));
        let result = orchestrator(vec![provider], 1).analyze(&profile(), None).await;

        assert_eq!(result.produced_by, ProducedBy::Fallback);
        assert_eq!(result.fallback_reason, Some(FallbackReason::ExtractionFailed));
        assert_eq!(result.raw.as_deref(), Some(raw));
        assert!(result.result.is_well_formed());
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(
            ProviderKind::Anthropic,
            vec![Reply::Status(401)],
        ));
        let result = orchestrator(vec![provider.clone()], 3)
            .analyze(&profile(), None)
            .await;

        assert_eq!(result.fallback_reason, Some(FallbackReason::ProviderCallFailed));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_error_is_retried_then_succeeds() {
        let provider = Arc::new(ScriptedProvider::new(
            ProviderKind::Anthropic,
            vec![Reply::Status(503), Reply::Status(429), Reply::Text(VALID.to_string())],
        ));
        let result = orchestrator(vec![provider.clone()], 2)
            .analyze(&profile(), None)
            .await;

        assert_eq!(result.produced_by, ProducedBy::Anthropic);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_falls_back() {
        let provider = Arc::new(ScriptedProvider::new(
            ProviderKind::Anthropic,
            vec![Reply::Status(500)],
        ));
        let result = orchestrator(vec![provider.clone()], 1)
            .analyze(&profile(), None)
            .await;

        assert_eq!(result.fallback_reason, Some(FallbackReason::ProviderCallFailed));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_provider_times_out() {
        let provider = Arc::new(ScriptedProvider::new(ProviderKind::OpenAi, vec![Reply::Hang]));
        let result = orchestrator(vec![provider], 1).analyze(&profile(), None).await;

        assert_eq!(result.produced_by, ProducedBy::Fallback);
        assert_eq!(result.fallback_reason, Some(FallbackReason::ProviderTimedOut));
        assert!(result.result.is_well_formed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_counts_against_timeout() {
        let provider = Arc::new(ScriptedProvider::new(
            ProviderKind::Anthropic,
            vec![Reply::Status(503)],
        ));
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(ProviderDispatcher::new(vec![provider.clone()])),
            Duration::from_millis(1500),
            5,
            None,
        );
        let result = orchestrator.analyze(&profile(), None).await;

        // 1s backoff fits in the budget, the following 2s one does not.
        assert_eq!(result.fallback_reason, Some(FallbackReason::ProviderTimedOut));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_default_provider_used_when_none_requested() {
        let anthropic = Arc::new(ScriptedProvider::text(ProviderKind::Anthropic, VALID));
        let openai = Arc::new(ScriptedProvider::text(ProviderKind::OpenAi, VALID));
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(ProviderDispatcher::new(vec![anthropic.clone(), openai.clone()])),
            Duration::from_secs(45),
            0,
            Some(ProviderKind::OpenAi),
        );

        let result = orchestrator.analyze(&profile(), None).await;
        assert_eq!(result.produced_by, ProducedBy::OpenAi);
        assert_eq!(anthropic.call_count(), 0);

        let result = orchestrator
            .analyze(&profile(), Some(ProviderKind::Anthropic))
            .await;
        assert_eq!(result.produced_by, ProducedBy::Anthropic);
    }

    #[tokio::test]
    async fn test_never_returns_invalid_shape() {
        let replies = [VALID, r#"{"careerMatches": [}"#, "no json here", "{}"];
        for with_provider in [true, false] {
            for reply in replies {
                let providers: Vec<Arc<dyn LlmProvider>> = if with_provider {
                    vec![Arc::new(ScriptedProvider::text(ProviderKind::Anthropic, reply))]
                } else {
                    vec![]
                };
                let result = orchestrator(providers, 0).analyze(&profile(), None).await;
                assert!(result.result.is_well_formed(), "reply {reply:?}");
            }
        }
    }
}
