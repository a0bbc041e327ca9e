use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, configured LLM providers and the live session count.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let providers = state.orchestrator.dispatcher().configured();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "waypoint-api",
        "providers": providers,
        "fallback_only": providers.is_empty(),
        "active_sessions": state.sessions.count().await
    }))
}
