use std::sync::Arc;

use crate::analysis::orchestrator::AnalysisOrchestrator;
use crate::assessment::session::SessionStore;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionStore>,
    /// Owns the provider dispatcher; the credential set inside it never changes after startup.
    pub orchestrator: Arc<AnalysisOrchestrator>,
}
