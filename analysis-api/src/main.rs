//! Market Analysis API Server
//!
//! HTTP API server that exposes the language-model analysis service to the
//! trading dashboard.

mod routes;

use analysis_ai::{AiConfig, AnalysisRequestService};
use axum::{
    http::{header, Method},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Analysis service (optional - requires OPENAI_API_KEY)
    pub analysis_service: Option<Arc<AnalysisRequestService>>,
}

/// Build the full router for the given state
pub fn app(state: AppState) -> Router {
    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,analysis_api=debug,analysis_ai=debug,tower_http=debug")
            }),
        )
        .init();

    info!("Starting Market Analysis API");

    // Initialize analysis service (optional - may fail if OPENAI_API_KEY is not set)
    let analysis_service = match AiConfig::from_env().and_then(|c| {
        info!(base_url = %c.base_url, timeout = ?c.timeout, "Loaded analysis backend config");
        AnalysisRequestService::from_config(&c)
    }) {
        Ok(service) => {
            info!("Analysis service initialized ({})", service.backend_name());
            Some(Arc::new(service))
        }
        Err(e) => {
            warn!(
                "Analysis service not available: {}. Set OPENAI_API_KEY to enable.",
                e
            );
            None
        }
    };

    let app = app(AppState { analysis_service });

    // Start server
    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
