use std::time::Duration;

use analysis_core::{AnalysisError, AnalysisResult};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::backend::{ChatBackend, ChatRequest};
use crate::config::AiConfig;

/// Chat-completion backend speaking the OpenAI HTTP API
#[derive(Debug, Clone)]
pub struct OpenAIBackend {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAIBackend {
    pub fn new(config: &AiConfig) -> AnalysisResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            timeout: config.timeout,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: ChatRequest) -> AnalysisResult<String> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout(self.timeout)
                } else {
                    AnalysisError::transport(format!("OpenAI API request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(translate_status(status, &body, retry_after));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::transport(format!("Failed to read OpenAI response: {}", e)))?;

        extract_content(&body)
    }

    fn backend_name(&self) -> &'static str {
        "openai"
    }
}

/// Map a non-success status to the error taxonomy
fn translate_status(status: StatusCode, body: &str, retry_after: Option<Duration>) -> AnalysisError {
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("insufficient_quota") {
        warn!(%status, ?retry_after, "OpenAI rate limit or quota hit");
        return AnalysisError::rate_limited(
            format!("OpenAI API error ({}): {}", status, body),
            retry_after,
        );
    }

    AnalysisError::transport(format!("OpenAI API error ({}): {}", status, body))
}

/// Pull the assistant text out of a chat-completion body
fn extract_content(body: &str) -> AnalysisResult<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        AnalysisError::malformed(format!("Failed to parse OpenAI response: {}", e), body)
    })?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::malformed("No choices in OpenAI response", body))?;

    if let Some(reason) = choice.finish_reason.as_deref() {
        if reason == "length" {
            debug!("OpenAI response was cut off at the token limit");
        }
    }

    if let Some(refusal) = choice.message.refusal {
        return Err(AnalysisError::malformed(
            format!("Model refused the request: {}", refusal),
            body,
        ));
    }

    choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AnalysisError::malformed("No content in OpenAI response", body))
}

/// `Retry-After` as whole or fractional seconds
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}
