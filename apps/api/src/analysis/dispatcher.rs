//! Provider Dispatcher: picks one credentialed provider and sends it the analysis prompt.
//!
//! The provider set is fixed when the dispatcher is built at startup and is never
//! mutated afterwards, so it is shared behind an `Arc` without locking.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::prompts::{analysis_system, render_analysis_prompt};
use crate::assessment::models::AssessmentProfile;
use crate::config::Config;
use crate::llm_client::{
    AnthropicClient, LlmError, LlmProvider, OpenAiClient, ProviderKind,
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No LLM provider is configured")]
    NoProviderConfigured,

    #[error("{provider} call failed: {source}")]
    ProviderCallFailed {
        provider: ProviderKind,
        #[source]
        source: LlmError,
    },
}

impl DispatchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::NoProviderConfigured => false,
            DispatchError::ProviderCallFailed { source, .. } => source.is_retryable(),
        }
    }
}

/// Raw reply together with the provider that produced it.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub provider: ProviderKind,
    pub raw_text: String,
}

#[derive(Clone)]
pub struct ProviderDispatcher {
    /// Credentialed providers in `ProviderKind::ALL` order, at most one per kind.
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderDispatcher {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        let mut ordered: Vec<Arc<dyn LlmProvider>> = Vec::new();
        for kind in ProviderKind::ALL {
            if let Some(p) = providers.iter().find(|p| p.kind() == kind) {
                ordered.push(Arc::clone(p));
            }
        }
        Self { providers: ordered }
    }

    /// Builds a binding for every credential slot that holds a key.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let timeout = config.analysis_timeout();
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
        if let Some(key) = &config.anthropic_api_key {
            providers.push(Arc::new(AnthropicClient::new(key.clone(), timeout)?));
        }
        if let Some(key) = &config.openai_api_key {
            providers.push(Arc::new(OpenAiClient::new(key.clone(), timeout)?));
        }
        let dispatcher = Self::new(providers);
        info!("Configured LLM providers: {:?}", dispatcher.configured());
        Ok(dispatcher)
    }

    pub fn configured(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    /// The preferred provider if it has credentials, else the first one that does.
    pub fn select(
        &self,
        preferred: Option<ProviderKind>,
    ) -> Result<Arc<dyn LlmProvider>, DispatchError> {
        preferred
            .and_then(|kind| self.providers.iter().find(|p| p.kind() == kind))
            .or_else(|| self.providers.first())
            .cloned()
            .ok_or(DispatchError::NoProviderConfigured)
    }

    /// One provider round trip. Never retries and never calls the network when
    /// no provider is configured.
    pub async fn dispatch(
        &self,
        profile: &AssessmentProfile,
        preferred: Option<ProviderKind>,
    ) -> Result<Dispatched, DispatchError> {
        let provider = self.select(preferred)?;
        let kind = provider.kind();
        if preferred.is_some_and(|p| p != kind) {
            debug!("Preferred provider {:?} not configured, using {kind}", preferred);
        }

        let prompt = render_analysis_prompt(profile);
        let started = Instant::now();
        let raw_text = provider
            .complete(&analysis_system(), &prompt)
            .await
            .map_err(|source| DispatchError::ProviderCallFailed {
                provider: kind,
                source,
            })?;

        debug!(
            "{kind} answered in {}ms ({} chars)",
            started.elapsed().as_millis(),
            raw_text.len()
        );

        Ok(Dispatched {
            provider: kind,
            raw_text,
        })
    }
}
