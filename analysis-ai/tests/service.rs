//! End-to-end tests for the analysis request service over a scripted backend
//!
//! Run with: cargo test -p analysis-ai --test service

mod common;

use std::time::Duration;

use analysis_ai::{cancellable, ChatRole};
use analysis_core::{
    AnalysisError, Direction, ReasoningEffort, SentimentLabel, Verbosity,
};
use common::{prediction_json, sentiment_json, service, Reply, ScriptedBackend};
use futures::future::AbortHandle;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_predict_with_default_settings() {
    let backend = ScriptedBackend::with_replies(vec![Reply::ok(prediction_json("bullish", 0.7))]);
    let service = service(&backend);

    let result = assert_ok!(service.predict("BTCUSD", &json!({})).await);
    assert_eq!(result.symbol, "BTCUSD");
    assert_eq!(result.timeframe, "1h");
    assert_eq!(result.direction, Direction::Bullish);
    assert_eq!(result.targets.unwrap().resistance, Some(69000.0));

    let request = backend.last_request();
    let user = request.message(ChatRole::User).unwrap();
    assert!(user.contains("BTCUSD"));
    assert!(user.contains("1h"));
    assert_eq!(request.model, "gpt-5");
    assert_eq!(request.reasoning_effort, Some(ReasoningEffort::Medium));
    assert_eq!(request.verbosity, Some(Verbosity::Medium));
    assert_eq!(request.max_completion_tokens, Some(2000));
    assert!(!request.stream);
    let format = request.response_format.expect("structured output requested");
    assert_eq!(format["json_schema"]["name"], "prediction_result");
}

#[tokio::test]
async fn test_predict_sanitizes_settings_before_sending() {
    let backend = ScriptedBackend::with_replies(vec![
        Reply::ok(prediction_json("neutral", 0.5)),
        Reply::ok(prediction_json("neutral", 0.5)),
    ]);
    let service = service(&backend);

    let settings = json!({
        "model": "fallback",
        "maxTokens": 100000,
        "timeframe": "1d",
        "reasoningEffort": "high",
    });
    let result = assert_ok!(service.predict("ETHUSD", &settings).await);
    assert_eq!(result.timeframe, "1d");

    let request = backend.last_request();
    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.max_completion_tokens, Some(4000));
    assert_eq!(request.reasoning_effort, None);
    assert_eq!(request.verbosity, None);

    assert_ok!(service.predict("ETHUSD", &json!({ "model": "gpt-3", "maxTokens": 50 })).await);
    let request = backend.last_request();
    assert_eq!(request.model, "gpt-5");
    assert_eq!(request.max_completion_tokens, Some(500));
}

#[tokio::test]
async fn test_predict_missing_direction_is_rejected() {
    let raw = r#"{"confidence":0.6,"narrative":"Unclear.","keyFactors":[],"riskLevel":"low","targets":null,"recommendations":null}"#;
    let backend = ScriptedBackend::with_replies(vec![Reply::ok(raw)]);
    let service = service(&backend);

    let err = assert_err!(service.predict("BTCUSD", &json!({})).await);
    assert!(matches!(err, AnalysisError::MalformedResponse { .. }), "{:?}", err);
    assert_eq!(err.raw_response(), Some(raw));
}

#[tokio::test]
async fn test_system_prompt_override_reaches_backend() {
    let backend = ScriptedBackend::with_replies(vec![Reply::ok(prediction_json("bearish", 0.8))]);
    let service = service(&backend);

    let settings = json!({ "systemPromptOverride": "You only trade breakouts." });
    assert_ok!(service.predict("SOLUSD", &settings).await);

    let request = backend.last_request();
    assert_eq!(request.message(ChatRole::System), Some("You only trade breakouts."));
    assert!(request.message(ChatRole::User).unwrap().contains("SOLUSD"));
}

#[tokio::test]
async fn test_analyze_custom_defaults_confidence() {
    let backend = ScriptedBackend::with_replies(vec![Reply::ok(
        "Gold usually benefits when real yields fall.",
    )]);
    let service = service(&backend);

    let question = "Is gold a good hedge right now?";
    let result = assert_ok!(service.analyze_custom(question, &json!({})).await);
    assert_eq!(result.confidence, 0.8);
    assert_eq!(result.analysis, "Gold usually benefits when real yields fall.");
    assert!(result.recommendations.is_none());

    let request = backend.last_request();
    assert_eq!(request.message(ChatRole::User), Some(question));
    assert!(request.response_format.is_none());
}

#[tokio::test]
async fn test_analyze_custom_structured_uses_backend_confidence() {
    let reply = json!({
        "analysis": "Range-bound until CPI.",
        "confidence": 0.55,
        "keyInsights": ["Low volatility"],
        "riskFactors": ["CPI surprise"],
        "recommendations": null,
    });
    let backend = ScriptedBackend::with_replies(vec![Reply::ok(reply.to_string())]);
    let service = service(&backend);

    let result = assert_ok!(
        service
            .analyze_custom_structured("Where is SPY heading?", &json!({ "verbosity": "low" }))
            .await
    );
    assert_eq!(result.confidence, 0.55);
    assert_eq!(result.risk_factors.unwrap(), vec!["CPI surprise".to_string()]);

    let request = backend.last_request();
    assert_eq!(request.verbosity, Some(Verbosity::Low));
    assert_eq!(
        request.response_format.unwrap()["json_schema"]["name"],
        "custom_analysis_result"
    );
}

#[tokio::test]
async fn test_concurrent_predictions_are_independent() {
    // The first call answers last, so replies arrive out of submission order
    let backend = ScriptedBackend::with_replies(vec![
        Reply::ok_after(Duration::from_millis(80), prediction_json("bullish", 0.9)),
        Reply::ok(prediction_json("bearish", 0.6)),
    ]);
    let service = service(&backend);
    let settings = json!({ "timeframe": "4h" });

    let (first, second) = tokio::join!(
        service.predict("BTCUSD", &settings),
        service.predict("BTCUSD", &settings),
    );

    let first = assert_ok!(first);
    let second = assert_ok!(second);
    assert_eq!(first.direction, Direction::Bullish);
    assert_eq!(first.confidence, 0.9);
    assert_eq!(second.direction, Direction::Bearish);
    assert_eq!(second.confidence, 0.6);
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_identical_calls_are_not_cached() {
    let backend = ScriptedBackend::with_replies(vec![
        Reply::ok(prediction_json("bullish", 0.7)),
        Reply::ok(prediction_json("neutral", 0.4)),
    ]);
    let service = service(&backend);

    let a = assert_ok!(service.predict("AAPL", &json!({})).await);
    let b = assert_ok!(service.predict("AAPL", &json!({})).await);
    assert_ne!(a, b);
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_analyze_sentiment() {
    let backend = ScriptedBackend::with_replies(vec![Reply::ok(sentiment_json(0.45, "positive"))]);
    let service = service(&backend);

    let headlines = vec![
        "Spot ETF sees record inflows".to_string(),
        "Miners report higher hashrate".to_string(),
    ];
    let result = assert_ok!(service.analyze_sentiment("BTCUSD", &headlines).await);
    assert_eq!(result.symbol, "BTCUSD");
    assert_eq!(result.sentiment_label, SentimentLabel::Positive);
    assert!((-1.0..=1.0).contains(&result.sentiment_score));

    let user = backend.last_request().message(ChatRole::User).unwrap().to_string();
    assert!(user.contains("1. Spot ETF sees record inflows"));
    assert!(user.contains("2. Miners report higher hashrate"));
}

#[tokio::test]
async fn test_sentiment_out_of_range_is_rejected_not_clamped() {
    let backend = ScriptedBackend::with_replies(vec![Reply::ok(sentiment_json(1.7, "very_positive"))]);
    let service = service(&backend);

    let err = assert_err!(service.analyze_sentiment("BTCUSD", &[]).await);
    assert_eq!(err.kind(), "malformed_response");
}

#[tokio::test]
async fn test_backend_errors_propagate() {
    let backend = ScriptedBackend::with_replies(vec![
        Reply::err(AnalysisError::transport("connection refused")),
        Reply::err(AnalysisError::rate_limited(
            "429 Too Many Requests",
            Some(Duration::from_secs(7)),
        )),
    ]);
    let service = service(&backend);

    let err = assert_err!(service.predict("BTCUSD", &json!({})).await);
    assert!(err.is_transport());

    let err = assert_err!(service.analyze_custom("hello", &json!({})).await);
    assert_eq!(err.kind(), "rate_limited");
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));

    // Exactly one round trip per call, no retries
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = ScriptedBackend::with_replies(vec![Reply::ok_after(
        Duration::from_millis(500),
        prediction_json("bullish", 0.7),
    )]);
    let service = service(&backend).with_timeout(Duration::from_millis(20));

    let err = assert_err!(service.predict("BTCUSD", &json!({})).await);
    assert!(matches!(err, AnalysisError::Timeout(d) if d == Duration::from_millis(20)));
}

#[tokio::test]
async fn test_cancelled_request_drops_late_reply() {
    let backend = ScriptedBackend::with_replies(vec![Reply::ok_after(
        Duration::from_millis(300),
        prediction_json("bullish", 0.7),
    )]);
    let service = service(&backend);

    let (handle, registration) = AbortHandle::new_pair();
    let settings = json!({});
    let (result, _) = tokio::join!(
        cancellable(registration, service.predict("BTCUSD", &settings)),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.abort();
        },
    );

    let err = assert_err!(result);
    assert!(matches!(err, AnalysisError::Cancelled));
}

#[tokio::test]
async fn test_cancellable_passes_through_when_not_aborted() {
    let backend = ScriptedBackend::with_replies(vec![Reply::ok("Looks fine.")]);
    let service = service(&backend);

    let (_handle, registration) = AbortHandle::new_pair();
    let result = assert_ok!(cancellable(registration, service.analyze_custom("ok?", &json!({}))).await);
    assert_eq!(result.analysis, "Looks fine.");
}
