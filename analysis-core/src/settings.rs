//! Analysis settings and the sanitizer that produces them
//!
//! Settings arrive from the settings panel as loosely-typed JSON. They are
//! never rejected: every field that is missing, wrong-typed, outside its
//! allow-list or out of range is replaced by its default (or clamped), so
//! [`sanitize_settings`] is total and idempotent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Default confidence floor applied when the input has none
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.75;
/// Inclusive bounds for `confidenceFloor`
pub const CONFIDENCE_FLOOR_RANGE: (f64, f64) = (0.5, 1.0);

/// Default completion token limit
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
/// Inclusive bounds for `maxTokens`
pub const MAX_TOKENS_RANGE: (u32, u32) = (500, 4000);

wire_enum! {
    /// Backend model variant
    Model, default = Primary {
        Primary => "primary",
        PrimaryFast => "primary-fast",
        Fallback => "fallback",
        FallbackFast => "fallback-fast",
    }
}

impl Model {
    /// Whether the variant accepts `reasoning_effort` and `verbosity` hints
    pub fn supports_reasoning(&self) -> bool {
        matches!(self, Model::Primary | Model::PrimaryFast)
    }
}

wire_enum! {
    /// Which lens the prediction prompt asks the backend to use
    AnalysisType, default = Technical {
        Technical => "technical",
        Fundamental => "fundamental",
        Sentiment => "sentiment",
        Hybrid => "hybrid",
    }
}

wire_enum! {
    RiskTolerance, default = Medium {
        Conservative => "conservative",
        Medium => "medium",
        Aggressive => "aggressive",
    }
}

wire_enum! {
    /// Chart timeframe the analysis is framed around
    Timeframe, default = OneHour {
        FifteenMinutes => "15m",
        OneHour => "1h",
        FourHours => "4h",
        OneDay => "1d",
        OneWeek => "1w",
    }
}

wire_enum! {
    ReasoningEffort, default = Medium {
        Minimal => "minimal",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

wire_enum! {
    Verbosity, default = Medium {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// Fully-populated, schema-valid analysis settings
///
/// Only [`sanitize_settings`] should build this from user input. The
/// `Default` impl is the sanitized form of an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSettings {
    pub model: Model,
    pub analysis_type: AnalysisType,
    pub risk_tolerance: RiskTolerance,
    pub timeframe: Timeframe,
    pub reasoning_effort: ReasoningEffort,
    pub verbosity: Verbosity,
    /// Results below this confidence are hidden by callers
    pub confidence_floor: f64,
    pub max_tokens: u32,
    pub include_sentiment: bool,
    pub enable_predictions: bool,
    pub auto_refresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: Model::default(),
            analysis_type: AnalysisType::default(),
            risk_tolerance: RiskTolerance::default(),
            timeframe: Timeframe::default(),
            reasoning_effort: ReasoningEffort::default(),
            verbosity: Verbosity::default(),
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            max_tokens: DEFAULT_MAX_TOKENS,
            include_sentiment: true,
            enable_predictions: true,
            auto_refresh: false,
            system_prompt_override: None,
        }
    }
}

/// Turn an arbitrary, possibly partial or malformed settings object into a
/// complete [`AnalysisSettings`]
///
/// Never fails. Non-object input (null, arrays, scalars) yields the defaults.
pub fn sanitize_settings(raw: &Value) -> AnalysisSettings {
    let defaults = AnalysisSettings::default();

    let Some(obj) = raw.as_object() else {
        if !raw.is_null() {
            debug!("Settings input is not an object, using defaults");
        }
        return defaults;
    };

    let field = |key: &str| obj.get(key).filter(|v| !v.is_null());

    AnalysisSettings {
        model: enum_field(field("model"), "model", defaults.model),
        analysis_type: enum_field(field("analysisType"), "analysisType", defaults.analysis_type),
        risk_tolerance: enum_field(
            field("riskTolerance"),
            "riskTolerance",
            defaults.risk_tolerance,
        ),
        timeframe: enum_field(field("timeframe"), "timeframe", defaults.timeframe),
        reasoning_effort: enum_field(
            field("reasoningEffort"),
            "reasoningEffort",
            defaults.reasoning_effort,
        ),
        verbosity: enum_field(field("verbosity"), "verbosity", defaults.verbosity),
        confidence_floor: field("confidenceFloor")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .unwrap_or(defaults.confidence_floor)
            .clamp(CONFIDENCE_FLOOR_RANGE.0, CONFIDENCE_FLOOR_RANGE.1),
        max_tokens: field("maxTokens")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .map(|v| clamp_tokens(v.round()))
            .unwrap_or(defaults.max_tokens),
        include_sentiment: bool_field(field("includeSentiment"), defaults.include_sentiment),
        enable_predictions: bool_field(field("enablePredictions"), defaults.enable_predictions),
        auto_refresh: bool_field(field("autoRefresh"), defaults.auto_refresh),
        system_prompt_override: field("systemPromptOverride")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

fn enum_field<T>(value: Option<&Value>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match value {
        None => default,
        Some(v) => match v.as_str().map(str::parse::<T>) {
            Some(Ok(parsed)) => parsed,
            _ => {
                debug!(field = key, value = %v, "Invalid settings value, falling back to default");
                default
            }
        },
    }
}

fn bool_field(value: Option<&Value>, default: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(default)
}

fn clamp_tokens(value: f64) -> u32 {
    let (min, max) = MAX_TOKENS_RANGE;
    value.clamp(min as f64, max as f64) as u32
}
