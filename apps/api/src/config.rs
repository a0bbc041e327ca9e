use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::ProviderKind;

/// Application configuration loaded from environment variables.
/// Every variable is optional; with no provider key the service runs in
/// permanent fallback mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub default_provider: Option<ProviderKind>,
    pub analysis_timeout_secs: u64,
    pub analysis_max_retries: u32,
    pub session_ttl_minutes: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let default_provider = optional("DEFAULT_PROVIDER")
            .map(|v| v.parse::<ProviderKind>())
            .transpose()
            .context("DEFAULT_PROVIDER must be 'anthropic' or 'openai'")?;

        Ok(Config {
            anthropic_api_key: optional("ANTHROPIC_API_KEY"),
            openai_api_key: optional("OPENAI_API_KEY"),
            default_provider,
            analysis_timeout_secs: parse_or(&optional, "ANALYSIS_TIMEOUT_SECS", 45)?,
            analysis_max_retries: parse_or(&optional, "ANALYSIS_MAX_RETRIES", 1)?,
            session_ttl_minutes: parse_or(&optional, "SESSION_TTL_MINUTES", 120)?,
            port: parse_or(&optional, "PORT", 8080)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes)
    }

    pub fn has_any_provider(&self) -> bool {
        self.anthropic_api_key.is_some() || self.openai_api_key.is_some()
    }
}

fn parse_or<T, F>(optional: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match optional(key) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{value}'")),
        None => Ok(default),
    }
}
