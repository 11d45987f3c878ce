//! Analysis request service
//!
//! The single entry point callers use. Each operation sanitizes settings,
//! builds prompts, makes exactly one backend call bounded by a timeout and
//! parses the reply through the matching response contract. Nothing is
//! retried, cached or coalesced.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use analysis_core::{
    sanitize_settings, AnalysisError, AnalysisResult, AnalysisSettings, CustomAnalysisResult,
    PredictionResult, SentimentResult,
};
use futures::future::{AbortRegistration, Abortable};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::backend::{ChatBackend, ChatMessage, ChatRequest};
use crate::config::{AiConfig, ModelCatalog, DEFAULT_TIMEOUT_SECS};
use crate::contract::{self, ResponseKind};
use crate::openai::OpenAIBackend;
use crate::prompt::{self, PromptPair};

/// Orchestrates analysis requests against an injected chat backend
#[derive(Clone)]
pub struct AnalysisRequestService {
    backend: Arc<dyn ChatBackend>,
    models: ModelCatalog,
    timeout: Duration,
}

impl AnalysisRequestService {
    /// Create a service over an explicit backend
    pub fn new(backend: Arc<dyn ChatBackend>, models: ModelCatalog) -> Self {
        Self {
            backend,
            models,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create a service backed by the OpenAI HTTP API
    pub fn from_config(config: &AiConfig) -> AnalysisResult<Self> {
        let backend = OpenAIBackend::new(config)?;
        Ok(Self::new(Arc::new(backend), config.models.clone()).with_timeout(config.timeout))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Directional prediction for a symbol
    #[instrument(skip(self, settings), fields(request_id = %Uuid::new_v4()))]
    pub async fn predict(&self, symbol: &str, settings: &Value) -> AnalysisResult<PredictionResult> {
        let settings = sanitize_settings(settings);
        let prompts = prompt::prediction_prompts(symbol, &settings);
        let request = self.build_request(prompts, &settings, Some(ResponseKind::Prediction));

        let raw = self.send(request).await?;
        let result = contract::parse_prediction(&raw, symbol, settings.timeframe)
            .inspect_err(|e| warn!(error = %e, "Prediction reply rejected"))?;

        info!(
            direction = %result.direction,
            confidence = result.confidence,
            "Prediction ready"
        );
        Ok(result)
    }

    /// Free-text analysis without schema enforcement
    ///
    /// The reply text becomes `analysis` and confidence is fixed at
    /// [`analysis_core::UNSTRUCTURED_CONFIDENCE`].
    #[instrument(skip(self, text, settings), fields(request_id = %Uuid::new_v4(), prompt_len = text.len()))]
    pub async fn analyze_custom(
        &self,
        text: &str,
        settings: &Value,
    ) -> AnalysisResult<CustomAnalysisResult> {
        let settings = sanitize_settings(settings);
        let prompts = prompt::custom_prompts(text, &settings);
        let request = self.build_request(prompts, &settings, None);

        let raw = self.send(request).await?;
        contract::parse_custom_text(&raw)
            .inspect_err(|e| warn!(error = %e, "Custom analysis reply rejected"))
    }

    /// Free-text analysis with the structured schema enforced
    #[instrument(skip(self, text, settings), fields(request_id = %Uuid::new_v4(), prompt_len = text.len()))]
    pub async fn analyze_custom_structured(
        &self,
        text: &str,
        settings: &Value,
    ) -> AnalysisResult<CustomAnalysisResult> {
        let settings = sanitize_settings(settings);
        let prompts = prompt::custom_prompts(text, &settings);
        let request = self.build_request(prompts, &settings, Some(ResponseKind::CustomAnalysis));

        let raw = self.send(request).await?;
        contract::parse_custom_structured(&raw)
            .inspect_err(|e| warn!(error = %e, "Structured analysis reply rejected"))
    }

    /// Headline sentiment for a symbol, using default settings
    #[instrument(skip(self, headlines), fields(request_id = %Uuid::new_v4(), headlines = headlines.len()))]
    pub async fn analyze_sentiment(
        &self,
        symbol: &str,
        headlines: &[String],
    ) -> AnalysisResult<SentimentResult> {
        let settings = AnalysisSettings::default();
        let prompts = prompt::sentiment_prompts(symbol, headlines, &settings);
        let request = self.build_request(prompts, &settings, Some(ResponseKind::Sentiment));

        let raw = self.send(request).await?;
        let result = contract::parse_sentiment(&raw, symbol)
            .inspect_err(|e| warn!(error = %e, "Sentiment reply rejected"))?;

        info!(
            label = %result.sentiment_label,
            score = result.sentiment_score,
            "Sentiment ready"
        );
        Ok(result)
    }

    fn build_request(
        &self,
        prompts: PromptPair,
        settings: &AnalysisSettings,
        kind: Option<ResponseKind>,
    ) -> ChatRequest {
        // Fallback models reject reasoning hints
        let reasoning = settings.model.supports_reasoning();

        ChatRequest {
            model: self.models.resolve(settings.model).to_string(),
            messages: vec![ChatMessage::system(prompts.system), ChatMessage::user(prompts.user)],
            reasoning_effort: reasoning.then_some(settings.reasoning_effort),
            verbosity: reasoning.then_some(settings.verbosity),
            max_completion_tokens: Some(settings.max_tokens),
            response_format: kind.map(|k| k.response_format()),
            stream: false,
        }
    }

    async fn send(&self, request: ChatRequest) -> AnalysisResult<String> {
        info!(
            backend = self.backend.backend_name(),
            model = %request.model,
            max_tokens = ?request.max_completion_tokens,
            structured = request.response_format.is_some(),
            "Sending analysis request"
        );

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.backend.complete(request)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(raw)) => {
                debug!(elapsed_ms, reply_len = raw.len(), "Backend replied");
                Ok(raw)
            }
            Ok(Err(e)) => {
                warn!(elapsed_ms, kind = e.kind(), error = %e, "Backend call failed");
                Err(e)
            }
            Err(_) => {
                warn!(elapsed_ms, timeout = ?self.timeout, "Backend call timed out");
                Err(AnalysisError::Timeout(self.timeout))
            }
        }
    }
}

/// Run an analysis future that can be abandoned through its `AbortHandle`
///
/// An aborted call resolves to [`AnalysisError::Cancelled`] and its late
/// backend reply, if any, is dropped.
pub async fn cancellable<T, F>(registration: AbortRegistration, future: F) -> AnalysisResult<T>
where
    F: Future<Output = AnalysisResult<T>>,
{
    match Abortable::new(future, registration).await {
        Ok(result) => result,
        Err(_aborted) => {
            debug!("Analysis request cancelled");
            Err(AnalysisError::Cancelled)
        }
    }
}
