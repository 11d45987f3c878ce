//! Core types for the market analysis service
//!
//! This crate defines the shared data structures used across the workspace:
//! the sanitized analysis settings, the typed result records and the error
//! taxonomy for backend round trips.

#[macro_use]
mod macros;

pub mod error;
pub mod result;
pub mod settings;

pub use error::{AnalysisError, AnalysisResult, GENERIC_FAILURE_MESSAGE, RATE_LIMITED_MESSAGE};
pub use result::{
    CustomAnalysisResult, Direction, PredictionResult, PriceTargets, RiskLevel, SentimentLabel,
    SentimentResult, UNSTRUCTURED_CONFIDENCE,
};
pub use settings::{
    sanitize_settings, AnalysisSettings, AnalysisType, Model, ReasoningEffort, RiskTolerance,
    Timeframe, Verbosity,
};
