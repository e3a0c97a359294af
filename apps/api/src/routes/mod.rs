pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::errors::AppError;
use crate::recommend::handlers;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound("No such endpoint".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        // Recommendation API
        .route("/api/recommend", post(handlers::handle_recommend))
        .route("/api/ai", post(handlers::handle_ai))
        // Rule catalog administration
        .route("/api/rules", get(handlers::handle_list_rules))
        .route("/api/rules/:category", put(handlers::handle_upsert_rule))
        .fallback(not_found)
        .with_state(state)
}
