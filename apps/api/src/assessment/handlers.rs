use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::catalog::{SkillCategory, CATALOG};
use crate::assessment::models::{AssessmentProfile, Preferences, RatingKey, SkillRating};
use crate::assessment::proficiency::{level_of, Level};
use crate::assessment::session::Session;
use crate::assessment::wizard::{BlockedReason, Stage, Transition, Wizard};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Views
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BlockedView {
    #[serde(flatten)]
    pub reason: BlockedReason,
    pub message: String,
}

impl From<BlockedReason> for BlockedView {
    fn from(reason: BlockedReason) -> Self {
        let message = reason.message();
        Self { reason, message }
    }
}

/// Everything the wizard UI needs to render the current step.
#[derive(Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub stage: Stage,
    pub progress: u8,
    pub preferences: Option<Preferences>,
    pub selected: Vec<RatingKey>,
    /// Submitted ratings in selection order.
    pub ratings: Vec<SkillRating>,
    /// Why `advance` would be blocked right now, if it would be.
    pub blocked: Option<BlockedView>,
    /// Present from SkillsSummary onwards; frozen once the stage is Results.
    pub summary: Option<AssessmentProfile>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionView {
    fn capture(session: &Session, wizard: &Wizard) -> Self {
        let summary = match wizard.stage() {
            Stage::Results => wizard.frozen_profile().cloned(),
            Stage::SkillsSummary => Some(wizard.summary()),
            _ => None,
        };
        Self {
            id: session.id,
            stage: wizard.stage(),
            progress: wizard.progress(),
            preferences: wizard.preferences().cloned(),
            selected: wizard.selected().to_vec(),
            ratings: wizard
                .selected()
                .iter()
                .filter_map(|k| wizard.rating(k).cloned())
                .collect(),
            blocked: wizard.blocked_reason().map(BlockedView::from),
            summary,
            created_at: session.created_at,
            last_active: session.last_active(),
        }
    }
}

#[derive(Serialize)]
pub struct TransitionResponse {
    pub transition: Transition,
    /// Set when the transition was blocked, for direct display as form feedback.
    pub message: Option<String>,
    pub session: SessionView,
}

#[derive(Serialize)]
pub struct LevelView {
    pub level: Level,
    pub label: &'static str,
    pub description: &'static str,
    pub min: u8,
    pub max: u8,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub categories: &'static [SkillCategory],
    pub levels: Vec<LevelView>,
}

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PreferencesRequest {
    /// `null` or absent clears previously set preferences.
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

#[derive(Deserialize)]
pub struct SelectSkillsRequest {
    pub skills: Vec<String>,
}

#[derive(Deserialize)]
pub struct RatingRequest {
    pub key: String,
    pub value: f64,
}

pub(crate) async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Session>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Assessment {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/skills/catalog
pub async fn handle_catalog() -> Json<CatalogResponse> {
    // Level bands are derived from the level function so they cannot drift.
    let mut levels: Vec<LevelView> = Vec::new();
    for raw in 0..=100u8 {
        let level = level_of(raw as i64);
        match levels.last_mut() {
            Some(view) if view.level == level => view.max = raw,
            _ => levels.push(LevelView {
                level,
                label: level.label(),
                description: level.description(),
                min: raw,
                max: raw,
            }),
        }
    }
    Json(CatalogResponse {
        categories: CATALOG,
        levels,
    })
}

/// POST /api/v1/assessments
pub async fn handle_create_assessment(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create().await;
    let wizard = session.wizard().await;
    (
        StatusCode::CREATED,
        Json(SessionView::capture(&session, &wizard)),
    )
}

/// GET /api/v1/assessments/:id
pub async fn handle_get_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let wizard = session.wizard().await;
    Ok(Json(SessionView::capture(&session, &wizard)))
}

/// DELETE /api/v1/assessments/:id
pub async fn handle_delete_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Assessment {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/assessments/:id/preferences
pub async fn handle_set_preferences(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PreferencesRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard().await;
    wizard.set_preferences(req.preferences)?;
    Ok(Json(SessionView::capture(&session, &wizard)))
}

/// PUT /api/v1/assessments/:id/skills
pub async fn handle_select_skills(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectSkillsRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard().await;
    wizard.select_skills(req.skills)?;
    Ok(Json(SessionView::capture(&session, &wizard)))
}

/// POST /api/v1/assessments/:id/ratings
pub async fn handle_submit_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RatingRequest>,
) -> Result<Json<SessionView>, AppError> {
    let key: RatingKey = req
        .key
        .parse()
        .map_err(|e| AppError::Validation(format!("{e}")))?;
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard().await;
    wizard.submit_rating(&key, req.value)?;
    Ok(Json(SessionView::capture(&session, &wizard)))
}

/// POST /api/v1/assessments/:id/advance
/// A blocked transition is a normal 200 response carrying the reason.
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard().await;
    let transition = wizard.advance();
    Ok(Json(transition_response(&session, &wizard, transition)))
}

/// POST /api/v1/assessments/:id/back
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard().await;
    let transition = wizard.back();
    Ok(Json(transition_response(&session, &wizard, transition)))
}

fn transition_response(
    session: &Session,
    wizard: &Wizard,
    transition: Transition,
) -> TransitionResponse {
    let message = match &transition {
        Transition::Blocked { reason } => Some(reason.message()),
        Transition::Advanced { .. } => None,
    };
    TransitionResponse {
        transition,
        message,
        session: SessionView::capture(session, wizard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_level_bands_cover_full_range() {
        let Json(catalog) = handle_catalog().await;
        assert_eq!(catalog.levels.len(), 5);
        assert_eq!(catalog.levels[0].min, 0);
        assert_eq!(catalog.levels[0].max, 12);
        assert_eq!(catalog.levels[4].level, Level::Expert);
        assert_eq!(catalog.levels[4].min, 88);
        assert_eq!(catalog.levels[4].max, 100);
        assert!(!catalog.categories.is_empty());
    }

    #[test]
    fn test_blocked_view_flattens_reason_code() {
        let view = BlockedView::from(BlockedReason::UnratedSkills { remaining: 2 });
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["code"], "unrated_skills");
        assert_eq!(json["remaining"], 2);
        assert!(json["message"].as_str().unwrap().contains('2'));
    }
}
