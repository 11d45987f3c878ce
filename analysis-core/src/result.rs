//! Typed analysis results returned to callers
//!
//! These are built per request from a validated backend reply and never
//! stored by the service.

use serde::{Deserialize, Serialize};

/// Confidence reported for free-text analysis when the backend was not asked
/// for a structured confidence value
pub const UNSTRUCTURED_CONFIDENCE: f64 = 0.8;

wire_enum! {
    /// Expected price direction
    Direction, default = Neutral {
        Bullish => "bullish",
        Bearish => "bearish",
        Neutral => "neutral",
    }
}

wire_enum! {
    RiskLevel, default = Medium {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

wire_enum! {
    SentimentLabel, default = Neutral {
        VeryPositive => "very_positive",
        Positive => "positive",
        Neutral => "neutral",
        Negative => "negative",
        VeryNegative => "very_negative",
    }
}

/// Optional price levels attached to a prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTargets {
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub target_price: Option<f64>,
}

impl PriceTargets {
    pub fn is_empty(&self) -> bool {
        self.support.is_none() && self.resistance.is_none() && self.target_price.is_none()
    }
}

/// Directional call for a single symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Echoed from the request
    pub symbol: String,
    pub direction: Direction,
    /// In [0, 1]
    pub confidence: f64,
    pub narrative: String,
    pub key_factors: Vec<String>,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<PriceTargets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    /// Echoed from the sanitized settings
    pub timeframe: String,
}

/// Answer to a free-text question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAnalysisResult {
    pub analysis: String,
    /// In [0, 1]; [`UNSTRUCTURED_CONFIDENCE`] for unstructured replies
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_insights: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_factors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
}

impl CustomAnalysisResult {
    /// Wrap a plain-text reply
    pub fn unstructured(analysis: impl Into<String>) -> Self {
        Self {
            analysis: analysis.into(),
            confidence: UNSTRUCTURED_CONFIDENCE,
            key_insights: None,
            risk_factors: None,
            recommendations: None,
        }
    }
}

/// News sentiment for a single symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub symbol: String,
    /// In [-1, 1]
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    /// In [0, 1]
    pub confidence: f64,
    pub key_factors: Vec<String>,
}
