/// LLM Client: every outbound model call in Waypoint goes through this module.
///
/// Each supported provider is one `ProviderKind` variant plus one binding that
/// implements `LlmProvider`. Bindings translate a system instruction and a prompt
/// into their own request shape and return the reply text untouched; interpreting
/// that text is the analysis pipeline's job.
///
/// Bindings do not retry. Retry policy belongs to the caller (see
/// `analysis::orchestrator`), which can ask `LlmError::is_retryable`.
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anthropic;
pub mod openai;
pub mod prompts;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

/// Upper bound on reply length for all providers.
pub const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Transport failures, rate limits and server errors are worth another try;
    /// client errors (bad key, bad request) and empty replies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::EmptyContent => false,
        }
    }
}

/// The closed set of supported providers, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Anthropic, ProviderKind::OpenAi];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown provider '{0}' (expected 'anthropic' or 'openai')")]
pub struct UnknownProvider(pub String);

/// Accepts the provider name or a common product alias, case-insensitively.
impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" | "open_ai" | "gpt" | "chatgpt" => Ok(ProviderKind::OpenAi),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// One provider binding. Implementations must be cheap to share across tasks.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Sends one system instruction plus one user prompt and returns the reply text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}
