//! Settings validation endpoint for the settings panel

use analysis_core::{sanitize_settings, AnalysisSettings};
use axum::{routing::post, Json, Router};
use serde_json::Value;

use crate::AppState;

/// Create settings routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/settings/sanitize", post(sanitize))
}

/// POST /api/settings/sanitize - Normalize untrusted settings; never fails
async fn sanitize(Json(raw): Json<Value>) -> Json<AnalysisSettings> {
    Json(sanitize_settings(&raw))
}
