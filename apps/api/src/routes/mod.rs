pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::assessment::handlers as assessment;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Reference data
        .route("/api/v1/skills/catalog", get(assessment::handle_catalog))
        .route("/api/v1/providers", get(analysis::handle_providers))
        // Assessment wizard
        .route(
            "/api/v1/assessments",
            post(assessment::handle_create_assessment),
        )
        .route(
            "/api/v1/assessments/:id",
            get(assessment::handle_get_assessment).delete(assessment::handle_delete_assessment),
        )
        .route(
            "/api/v1/assessments/:id/preferences",
            put(assessment::handle_set_preferences),
        )
        .route(
            "/api/v1/assessments/:id/skills",
            put(assessment::handle_select_skills),
        )
        .route(
            "/api/v1/assessments/:id/ratings",
            post(assessment::handle_submit_rating),
        )
        .route(
            "/api/v1/assessments/:id/advance",
            post(assessment::handle_advance),
        )
        .route("/api/v1/assessments/:id/back", post(assessment::handle_back))
        // Analysis
        .route(
            "/api/v1/assessments/:id/analysis",
            post(analysis::handle_run_analysis).get(analysis::handle_get_analysis),
        )
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        .with_state(state)
}
