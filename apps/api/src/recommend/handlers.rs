//! Axum route handlers for the recommendation API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::recommend::models::{RecommendRequest, RecommendationOutcome, RuleEntry};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AiReplyResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct RuleCategoriesResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRuleRequest {
    pub keywords: Vec<String>,
    #[serde(alias = "response", alias = "response_template")]
    pub response_template: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/recommend
///
/// Rules first, then heuristics, then the generative fallback.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendationOutcome>, AppError> {
    let outcome = state
        .dispatcher
        .recommend(&request.message, &request.session_data)
        .await?;

    Ok(Json(outcome))
}

/// POST /api/ai
///
/// Direct generative reply, skipping the rule stages.
pub async fn handle_ai(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<AiReplyResponse>, AppError> {
    let reply = state
        .ai
        .reply(&request.message, &request.session_data)
        .await?;

    Ok(Json(AiReplyResponse { reply }))
}

/// GET /api/rules
///
/// Category keys in precedence order.
pub async fn handle_list_rules(State(state): State<AppState>) -> Json<RuleCategoriesResponse> {
    Json(RuleCategoriesResponse {
        categories: state.catalog.list_categories(),
    })
}

/// PUT /api/rules/:category
///
/// Inserts or replaces a catalog entry. Takes effect for the next request.
pub async fn handle_upsert_rule(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(request): Json<UpsertRuleRequest>,
) -> Result<Json<RuleEntry>, AppError> {
    let entry = state
        .catalog
        .upsert(&category, request.keywords, request.response_template)?;

    Ok(Json(entry))
}
