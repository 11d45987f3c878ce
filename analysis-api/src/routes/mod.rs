//! API route definitions

mod analysis;
mod health;
mod settings;

use axum::Router;
use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(analysis::routes())
        .merge(settings::routes())
        .merge(health::routes())
}
