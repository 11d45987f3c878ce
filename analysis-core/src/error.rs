//! Error types for analysis requests
//!
//! Invalid settings never show up here: they are sanitized, not rejected.

use std::time::Duration;
use thiserror::Error;

/// Caller-facing text for every failure that is not a rate limit
pub const GENERIC_FAILURE_MESSAGE: &str = "Analysis failed, please try again.";

/// Caller-facing text for throttling and quota exhaustion
pub const RATE_LIMITED_MESSAGE: &str =
    "The analysis service is busy right now, please wait a moment and try again.";

/// Analysis-wide error type
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Network failure or non-success status from the backend
    #[error("Backend transport error: {0}")]
    Transport(String),

    #[error("Backend did not answer within {0:?}")]
    Timeout(Duration),

    /// Backend signalled throttling or an exhausted quota
    #[error("Backend rate limited the request: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Backend replied, but the payload does not fit the expected schema
    #[error("Malformed backend response: {reason}")]
    MalformedResponse { reason: String, raw: String },

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn transport(msg: impl Into<String>) -> Self {
        AnalysisError::Transport(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>, retry_after: Option<Duration>) -> Self {
        AnalysisError::RateLimited {
            message: msg.into(),
            retry_after,
        }
    }

    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        AnalysisError::MalformedResponse {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Config(msg.into())
    }

    /// Stable machine-readable tag, used in API error bodies and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Transport(_) => "transport",
            AnalysisError::Timeout(_) => "timeout",
            AnalysisError::RateLimited { .. } => "rate_limited",
            AnalysisError::MalformedResponse { .. } => "malformed_response",
            AnalysisError::Cancelled => "cancelled",
            AnalysisError::Config(_) => "config",
        }
    }

    /// Message suitable for showing to an end user
    ///
    /// Transport failures, timeouts and malformed replies all read the same;
    /// the detail stays in logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::RateLimited { .. } => RATE_LIMITED_MESSAGE,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }

    /// Raw backend text attached to a malformed response
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AnalysisError::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Backoff hint for rate-limited requests
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AnalysisError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// True for failures reaching the backend, including timeouts
    pub fn is_transport(&self) -> bool {
        matches!(self, AnalysisError::Transport(_) | AnalysisError::Timeout(_))
    }
}

/// Result type alias for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
