use axum::{
    extract::{Path, State},
    Json,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::models::ProvenancedResult;
use crate::assessment::handlers::find_session;
use crate::assessment::models::Preferences;
use crate::assessment::normalizer::normalize;
use crate::assessment::wizard::Stage;
use crate::errors::AppError;
use crate::llm_client::ProviderKind;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RunAnalysisRequest {
    /// Provider name or alias; absent means the configured default.
    #[serde(default)]
    pub preferred_provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Rating key (`<skill>::<index>`) → slider value, kept in the caller's order.
    pub ratings: IndexMap<String, f64>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
    #[serde(default)]
    pub preferred_provider: Option<String>,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub analysis: ProvenancedResult,
    /// False when the result came from the built-in fallback.
    pub ai_enhanced: bool,
    /// Rating keys that could not be interpreted and were left out.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unparsed_keys: Vec<String>,
}

impl AnalysisResponse {
    fn new(analysis: ProvenancedResult, unparsed_keys: Vec<String>) -> Self {
        let ai_enhanced = analysis.is_ai_enhanced();
        Self {
            analysis,
            ai_enhanced,
            unparsed_keys,
        }
    }
}

#[derive(Serialize)]
pub struct ProvidersResponse {
    pub configured: Vec<ProviderKind>,
    pub default: Option<ProviderKind>,
    /// True when no provider has credentials and every analysis uses the fallback.
    pub fallback_only: bool,
    pub timeout_secs: u64,
}

/// An unrecognised name has no credentials, so it is treated like no preference
/// and the dispatcher's own selection order applies.
fn parse_provider(name: Option<&str>) -> Option<ProviderKind> {
    match name?.parse::<ProviderKind>() {
        Ok(kind) => Some(kind),
        Err(e) => {
            warn!("{e}, using the default provider order");
            None
        }
    }
}

/// GET /api/v1/providers
pub async fn handle_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let configured = state.orchestrator.dispatcher().configured();
    Json(ProvidersResponse {
        fallback_only: configured.is_empty(),
        configured,
        default: state.orchestrator.default_provider(),
        timeout_secs: state.config.analysis_timeout_secs,
    })
}

/// POST /api/v1/assessments/:id/analysis
/// Runs (or re-runs) analysis on the frozen profile. A call overtaken by a newer
/// one for the same assessment gets 409 and publishes nothing.
pub async fn handle_run_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<RunAnalysisRequest>>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let preferred = parse_provider(req.preferred_provider.as_deref());
    let session = find_session(&state, id).await?;

    // Snapshot under the lock, then release it before the slow provider call.
    let profile = {
        let wizard = session.wizard().await;
        if wizard.stage() != Stage::Results {
            return Err(AppError::Validation(format!(
                "Analysis is available once the assessment reaches results (current stage: {:?})",
                wizard.stage()
            )));
        }
        wizard.frozen_profile().cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Assessment {id} is at results without a frozen profile"))
        })?
    };

    let slot = session.analysis();
    let ticket = slot.issue();
    info!("Running analysis {} for assessment {id}", ticket.generation());
    let analysis = slot
        .run(ticket, state.orchestrator.analyze(&profile, preferred))
        .await?;

    Ok(Json(AnalysisResponse::new(analysis, profile.unparsed_keys.clone())))
}

/// GET /api/v1/assessments/:id/analysis
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let analysis = session
        .analysis()
        .latest()
        .await
        .ok_or_else(|| AppError::NotFound(format!("No analysis has been run for assessment {id}")))?;
    Ok(Json(AnalysisResponse::new(analysis, Vec::new())))
}

/// POST /api/v1/analyze
/// Stateless analysis for callers that keep their own wizard state.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let preferred = parse_provider(req.preferred_provider.as_deref());
    let preferences = req
        .preferences
        .map(Preferences::sanitized)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = normalize(req.ratings, preferences);
    let analysis = state.orchestrator.analyze(&profile, preferred).await;
    Ok(Json(AnalysisResponse::new(analysis, profile.unparsed_keys)))
}
