//! System and user prompt construction
//!
//! Prompts are pure functions of the request and the sanitized settings. A
//! `systemPromptOverride` replaces the generated system prompt and never
//! touches the user prompt.

use analysis_core::{AnalysisSettings, AnalysisType, RiskTolerance};

/// System prompt for free-text questions
pub const CUSTOM_SYSTEM_PROMPT: &str = "You are an expert financial analyst and trading assistant. \
Give clear, balanced and actionable analysis of markets, assets and trading strategies. \
Always call out the main risks and avoid presenting speculation as certainty.";

const SENTIMENT_SYSTEM_PROMPT: &str = "You are an expert financial sentiment analyst. \
Score the sentiment around the given asset from -1 (very negative) to 1 (very positive), \
label it, state how confident you are and list the factors driving it. \
Respond only with JSON matching the provided schema.";

const SENTIMENT_INSTRUCTION: &str = "Also factor in current market sentiment: news flow, \
social media mood and positioning. State how sentiment supports or contradicts your call.";

/// System and user prompt sent together as one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    fn new(system: String, user: String, settings: &AnalysisSettings) -> Self {
        let system = settings.system_prompt_override.clone().unwrap_or(system);
        Self { system, user }
    }
}

/// Prompts for a symbol-based directional prediction
pub fn prediction_prompts(symbol: &str, settings: &AnalysisSettings) -> PromptPair {
    let analysis_type = settings.analysis_type;

    let mut system = format!(
        "{} Perform {} analysis. {} Respond only with JSON matching the provided schema.",
        analyst_role(analysis_type),
        analysis_type,
        risk_framing(settings.risk_tolerance),
    );
    if settings.include_sentiment {
        system.push(' ');
        system.push_str(SENTIMENT_INSTRUCTION);
    }

    let user = format!(
        r#"Analyze {symbol} on the {timeframe} timeframe using {analysis_type} analysis.

Provide, in this order:
1. Direction: bullish, bearish or neutral
2. Confidence from 0 to 1, with the reasoning behind it
3. Key factors driving the outlook
4. Risk assessment: low, medium or high
5. Price targets: support, resistance and target price
6. Recommendations"#,
        symbol = symbol,
        timeframe = settings.timeframe,
        analysis_type = analysis_type,
    );

    PromptPair::new(system, user, settings)
}

/// Prompts for a free-text question; the user text is sent unmodified
pub fn custom_prompts(text: &str, settings: &AnalysisSettings) -> PromptPair {
    PromptPair::new(CUSTOM_SYSTEM_PROMPT.to_string(), text.to_string(), settings)
}

/// Prompts for headline sentiment scoring
pub fn sentiment_prompts(
    symbol: &str,
    headlines: &[String],
    settings: &AnalysisSettings,
) -> PromptPair {
    let user = if headlines.is_empty() {
        format!(
            "No recent headlines were provided. Assess the current market sentiment for {} \
             from general market context.",
            symbol
        )
    } else {
        let listed = headlines
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{}. {}", i + 1, h.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Assess the market sentiment for {} from these recent headlines:\n\n{}",
            symbol, listed
        )
    };

    PromptPair::new(SENTIMENT_SYSTEM_PROMPT.to_string(), user, settings)
}

fn analyst_role(analysis_type: AnalysisType) -> &'static str {
    match analysis_type {
        AnalysisType::Technical => {
            "You are an expert technical analyst for financial markets. Base your view on \
             price action, trend structure, chart patterns, momentum and volume."
        }
        AnalysisType::Fundamental => {
            "You are an expert fundamental analyst for financial markets. Base your view on \
             valuation, earnings or network fundamentals, macro conditions and competitive position."
        }
        AnalysisType::Sentiment => {
            "You are an expert market sentiment analyst. Base your view on news flow, \
             positioning, funding and crowd psychology."
        }
        AnalysisType::Hybrid => {
            "You are an expert financial analyst combining technical and fundamental analysis. \
             Weigh chart structure against the underlying fundamentals."
        }
    }
}

fn risk_framing(risk: RiskTolerance) -> &'static str {
    match risk {
        RiskTolerance::Conservative => {
            "The trader is conservative: favour capital preservation and tight risk limits."
        }
        RiskTolerance::Medium => "The trader has a medium risk tolerance.",
        RiskTolerance::Aggressive => {
            "The trader is aggressive: higher-volatility setups are acceptable."
        }
    }
}
