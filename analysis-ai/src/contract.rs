//! Structured response contract
//!
//! Declares the JSON schema requested from the backend for each result kind
//! and turns the backend's reply into a typed record. Backend values are
//! validated, never clamped: anything out of range is a malformed response.

use analysis_core::{
    AnalysisError, AnalysisResult, CustomAnalysisResult, Direction, PredictionResult,
    PriceTargets, RiskLevel, SentimentLabel, SentimentResult, Timeframe,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Result kinds with a structured-output schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Prediction,
    CustomAnalysis,
    Sentiment,
}

impl ResponseKind {
    pub fn schema_name(&self) -> &'static str {
        match self {
            ResponseKind::Prediction => "prediction_result",
            ResponseKind::CustomAnalysis => "custom_analysis_result",
            ResponseKind::Sentiment => "sentiment_result",
        }
    }

    /// JSON schema of the reply body
    ///
    /// Strict structured output needs every property listed as required, so
    /// optional fields are declared nullable instead.
    pub fn schema(&self) -> Value {
        match self {
            ResponseKind::Prediction => json!({
                "type": "object",
                "properties": {
                    "direction": enum_schema(Direction::ALL.iter().map(|d| d.as_str())),
                    "confidence": unit_interval(),
                    "narrative": { "type": "string" },
                    "keyFactors": string_list(),
                    "riskLevel": enum_schema(RiskLevel::ALL.iter().map(|r| r.as_str())),
                    "targets": {
                        "type": ["object", "null"],
                        "properties": {
                            "support": nullable_price(),
                            "resistance": nullable_price(),
                            "targetPrice": nullable_price(),
                        },
                        "required": ["support", "resistance", "targetPrice"],
                        "additionalProperties": false,
                    },
                    "recommendations": nullable_string_list(),
                },
                "required": [
                    "direction", "confidence", "narrative", "keyFactors",
                    "riskLevel", "targets", "recommendations",
                ],
                "additionalProperties": false,
            }),
            ResponseKind::CustomAnalysis => json!({
                "type": "object",
                "properties": {
                    "analysis": { "type": "string" },
                    "confidence": unit_interval(),
                    "keyInsights": nullable_string_list(),
                    "riskFactors": nullable_string_list(),
                    "recommendations": nullable_string_list(),
                },
                "required": [
                    "analysis", "confidence", "keyInsights", "riskFactors", "recommendations",
                ],
                "additionalProperties": false,
            }),
            ResponseKind::Sentiment => json!({
                "type": "object",
                "properties": {
                    "sentimentScore": { "type": "number", "minimum": -1, "maximum": 1 },
                    "sentimentLabel": enum_schema(SentimentLabel::ALL.iter().map(|l| l.as_str())),
                    "confidence": unit_interval(),
                    "keyFactors": string_list(),
                },
                "required": ["sentimentScore", "sentimentLabel", "confidence", "keyFactors"],
                "additionalProperties": false,
            }),
        }
    }

    /// `response_format` value for the chat request
    pub fn response_format(&self) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.schema_name(),
                "strict": true,
                "schema": self.schema(),
            },
        })
    }
}

fn enum_schema<'a>(values: impl Iterator<Item = &'a str>) -> Value {
    json!({ "type": "string", "enum": values.collect::<Vec<_>>() })
}

fn unit_interval() -> Value {
    json!({ "type": "number", "minimum": 0, "maximum": 1 })
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn nullable_string_list() -> Value {
    json!({ "type": ["array", "null"], "items": { "type": "string" } })
}

fn nullable_price() -> Value {
    json!({ "type": ["number", "null"] })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictionPayload {
    direction: Direction,
    confidence: f64,
    #[serde(alias = "reasoning")]
    narrative: String,
    key_factors: Vec<String>,
    risk_level: RiskLevel,
    #[serde(default)]
    targets: Option<PriceTargets>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomAnalysisPayload {
    analysis: String,
    confidence: f64,
    #[serde(default)]
    key_insights: Option<Vec<String>>,
    #[serde(default)]
    risk_factors: Option<Vec<String>>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentPayload {
    sentiment_score: f64,
    sentiment_label: SentimentLabel,
    confidence: f64,
    key_factors: Vec<String>,
}

/// Parse a prediction reply, echoing the requested symbol and timeframe
pub fn parse_prediction(
    raw: &str,
    symbol: &str,
    timeframe: Timeframe,
) -> AnalysisResult<PredictionResult> {
    let payload: PredictionPayload = decode(raw, ResponseKind::Prediction)?;

    check_unit_interval("confidence", payload.confidence, raw)?;

    let targets = match payload.targets {
        Some(targets) => {
            for (name, price) in [
                ("targets.support", targets.support),
                ("targets.resistance", targets.resistance),
                ("targets.targetPrice", targets.target_price),
            ] {
                if let Some(price) = price {
                    if !price.is_finite() || price < 0.0 {
                        return Err(AnalysisError::malformed(
                            format!("{} is not a valid price: {}", name, price),
                            raw,
                        ));
                    }
                }
            }
            Some(targets).filter(|t| !t.is_empty())
        }
        None => None,
    };

    Ok(PredictionResult {
        symbol: symbol.to_string(),
        direction: payload.direction,
        confidence: payload.confidence,
        narrative: payload.narrative,
        key_factors: payload.key_factors,
        risk_level: payload.risk_level,
        targets,
        recommendations: payload.recommendations,
        timeframe: timeframe.to_string(),
    })
}

/// Parse a schema-enforced free-text analysis reply
pub fn parse_custom_structured(raw: &str) -> AnalysisResult<CustomAnalysisResult> {
    let payload: CustomAnalysisPayload = decode(raw, ResponseKind::CustomAnalysis)?;

    check_unit_interval("confidence", payload.confidence, raw)?;

    Ok(CustomAnalysisResult {
        analysis: payload.analysis,
        confidence: payload.confidence,
        key_insights: payload.key_insights,
        risk_factors: payload.risk_factors,
        recommendations: payload.recommendations,
    })
}

/// Wrap a plain-text reply; confidence is the fixed unstructured default
pub fn parse_custom_text(raw: &str) -> AnalysisResult<CustomAnalysisResult> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AnalysisError::malformed("Empty analysis reply", raw));
    }
    Ok(CustomAnalysisResult::unstructured(text))
}

/// Parse a sentiment reply, echoing the requested symbol
pub fn parse_sentiment(raw: &str, symbol: &str) -> AnalysisResult<SentimentResult> {
    let payload: SentimentPayload = decode(raw, ResponseKind::Sentiment)?;

    if !(-1.0..=1.0).contains(&payload.sentiment_score) {
        return Err(AnalysisError::malformed(
            format!("sentimentScore out of range [-1, 1]: {}", payload.sentiment_score),
            raw,
        ));
    }
    check_unit_interval("confidence", payload.confidence, raw)?;

    Ok(SentimentResult {
        symbol: symbol.to_string(),
        sentiment_score: payload.sentiment_score,
        sentiment_label: payload.sentiment_label,
        confidence: payload.confidence,
        key_factors: payload.key_factors,
    })
}

fn decode<T: DeserializeOwned>(raw: &str, kind: ResponseKind) -> AnalysisResult<T> {
    let json_str = extract_json(raw)
        .ok_or_else(|| AnalysisError::malformed("No JSON found in response", raw))?;

    serde_json::from_str(json_str).map_err(|e| {
        AnalysisError::malformed(format!("Failed to parse {}: {}", kind.schema_name(), e), raw)
    })
}

fn check_unit_interval(name: &str, value: f64, raw: &str) -> AnalysisResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::malformed(
            format!("{} out of range [0, 1]: {}", name, value),
            raw,
        ))
    }
}

/// Locate the JSON object in a reply
///
/// The reply is either a bare object or a single markdown code fence spanning
/// the whole reply. Fences inside a bare object belong to its string values.
fn extract_json(content: &str) -> Option<&str> {
    let content = content.trim();
    if content.starts_with('{') {
        return Some(content);
    }

    let body = content.strip_prefix("```")?.strip_suffix("```")?;
    let body = body.strip_prefix("json").unwrap_or(body).trim();
    (body.starts_with('{') && !body.contains("```")).then_some(body)
}
