//! Analysis API endpoints backed by the language-model service

use std::sync::Arc;

use analysis_ai::AnalysisRequestService;
use analysis_core::AnalysisError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::AppState;

/// Create analysis routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analysis/predict", post(predict))
        .route("/analysis/custom", post(analyze_custom))
        .route("/analysis/sentiment", post(analyze_sentiment))
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    symbol: String,
    /// Untrusted settings, sanitized by the service
    #[serde(default)]
    settings: Value,
}

#[derive(Debug, Deserialize)]
struct CustomRequest {
    prompt: String,
    #[serde(default)]
    settings: Value,
    /// Enforce the structured schema instead of plain text
    #[serde(default)]
    structured: bool,
}

#[derive(Debug, Deserialize)]
struct SentimentRequest {
    symbol: String,
    #[serde(default)]
    headlines: Vec<String>,
}

/// POST /api/analysis/predict - Directional prediction for a symbol
async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let body = match request_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let service = match available(&state) {
        Ok(service) => service,
        Err(response) => return response,
    };
    let symbol = body.symbol.trim();
    if symbol.is_empty() {
        return bad_request("symbol must not be empty");
    }

    info!("Prediction requested for {}", symbol);
    match service.predict(symbol, &body.settings).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => failure(e),
    }
}

/// POST /api/analysis/custom - Free-text question for the assistant
async fn analyze_custom(
    State(state): State<AppState>,
    body: Result<Json<CustomRequest>, JsonRejection>,
) -> Response {
    let body = match request_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let service = match available(&state) {
        Ok(service) => service,
        Err(response) => return response,
    };
    if body.prompt.trim().is_empty() {
        return bad_request("prompt must not be empty");
    }

    let outcome = if body.structured {
        service.analyze_custom_structured(&body.prompt, &body.settings).await
    } else {
        service.analyze_custom(&body.prompt, &body.settings).await
    };

    match outcome {
        Ok(result) => Json(result).into_response(),
        Err(e) => failure(e),
    }
}

/// POST /api/analysis/sentiment - Headline sentiment for a symbol
async fn analyze_sentiment(
    State(state): State<AppState>,
    body: Result<Json<SentimentRequest>, JsonRejection>,
) -> Response {
    let body = match request_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let service = match available(&state) {
        Ok(service) => service,
        Err(response) => return response,
    };
    let symbol = body.symbol.trim();
    if symbol.is_empty() {
        return bad_request("symbol must not be empty");
    }

    info!("Sentiment requested for {} ({} headlines)", symbol, body.headlines.len());
    match service.analyze_sentiment(symbol, &body.headlines).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => failure(e),
    }
}

fn available(state: &AppState) -> Result<&Arc<AnalysisRequestService>, Response> {
    state.analysis_service.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Analysis service not available. Check the OPENAI_API_KEY environment variable."
                    .to_string(),
                kind: "config",
            }),
        )
            .into_response()
    })
}

/// Unwrap a JSON body, answering 400 in the usual error shape when it is unusable
fn request_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(body)| body).map_err(|rejection| {
        warn!("Rejected analysis request body: {}", rejection.body_text());
        bad_request(&rejection.body_text())
    })
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            kind: "bad_request",
        }),
    )
        .into_response()
}

/// Translate a service error into an HTTP response
///
/// The body carries only the caller-facing message; the detail is logged.
fn failure(err: AnalysisError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(kind = err.kind(), "Analysis failed: {}", err);
    } else {
        warn!(kind = err.kind(), "Analysis failed: {}", err);
    }

    let mut response = (
        status,
        Json(ErrorResponse {
            error: err.user_message().to_string(),
            kind: err.kind(),
        }),
    )
        .into_response();

    if let Some(retry_after) = err.retry_after() {
        let secs = retry_after.as_secs_f64().ceil() as u64;
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }

    response
}

fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        AnalysisError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        AnalysisError::Transport(_) | AnalysisError::MalformedResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
        AnalysisError::Cancelled | AnalysisError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
