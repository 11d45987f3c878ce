//! Language-model analysis service for market analysis
//!
//! This crate turns analysis requests (a symbol, a free-text question or a
//! batch of headlines) into a single structured-output call against a
//! chat-completion backend and parses the reply into typed results.

pub mod backend;
pub mod config;
pub mod contract;
pub mod openai;
pub mod prompt;
pub mod service;

pub use analysis_core::sanitize_settings;
pub use backend::{ChatBackend, ChatMessage, ChatRequest, ChatRole};
pub use config::{AiConfig, ModelCatalog, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use contract::ResponseKind;
pub use openai::OpenAIBackend;
pub use prompt::PromptPair;
pub use service::{cancellable, AnalysisRequestService};
