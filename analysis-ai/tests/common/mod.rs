//! Shared helpers for service tests: a scripted in-memory chat backend

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use analysis_ai::{AnalysisRequestService, ChatBackend, ChatRequest, ModelCatalog};
use analysis_core::{AnalysisError, AnalysisResult};
use async_trait::async_trait;
use parking_lot::Mutex;

/// One canned backend answer
pub struct Reply {
    delay: Duration,
    outcome: AnalysisResult<String>,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::ok_after(Duration::ZERO, body)
    }

    pub fn ok_after(delay: Duration, body: impl Into<String>) -> Self {
        Self {
            delay,
            outcome: Ok(body.into()),
        }
    }

    pub fn err(error: AnalysisError) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(error),
        }
    }
}

/// Backend that answers calls in order from a script and records requests
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn with_replies(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> ChatRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("backend was never called")
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: ChatRequest) -> AnalysisResult<String> {
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();

        match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.outcome
            }
            None => Err(AnalysisError::transport("no scripted reply left")),
        }
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

pub fn service(backend: &Arc<ScriptedBackend>) -> AnalysisRequestService {
    AnalysisRequestService::new(backend.clone(), ModelCatalog::default())
}

pub fn prediction_json(direction: &str, confidence: f64) -> String {
    serde_json::json!({
        "direction": direction,
        "confidence": confidence,
        "narrative": format!("Momentum reads {}.", direction),
        "keyFactors": ["Trend structure", "Volume"],
        "riskLevel": "medium",
        "targets": { "support": 61000.0, "resistance": 69000.0, "targetPrice": null },
        "recommendations": null,
    })
    .to_string()
}

pub fn sentiment_json(score: f64, label: &str) -> String {
    serde_json::json!({
        "sentimentScore": score,
        "sentimentLabel": label,
        "confidence": 0.7,
        "keyFactors": ["Headline tone"],
    })
    .to_string()
}
