//! Backend configuration loaded from the environment

use std::fmt;
use std::time::Duration;

use analysis_core::{AnalysisError, AnalysisResult, Model};

/// Default chat-completion API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default upper bound for a single backend round trip
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maps the four model variants to concrete backend model ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    pub primary: String,
    pub primary_fast: String,
    pub fallback: String,
    pub fallback_fast: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            primary: "gpt-5".to_string(),
            primary_fast: "gpt-5-mini".to_string(),
            fallback: "gpt-4o".to_string(),
            fallback_fast: "gpt-4o-mini".to_string(),
        }
    }
}

impl ModelCatalog {
    /// Backend model id for a variant
    pub fn resolve(&self, model: Model) -> &str {
        match model {
            Model::Primary => &self.primary,
            Model::PrimaryFast => &self.primary_fast,
            Model::Fallback => &self.fallback,
            Model::FallbackFast => &self.fallback_fast,
        }
    }
}

/// Configuration for the language-model backend
#[derive(Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub models: ModelCatalog,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("models", &self.models)
            .finish()
    }
}

impl AiConfig {
    /// Config with default endpoint, timeout and models
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            models: ModelCatalog::default(),
        }
    }

    /// Load from process environment
    ///
    /// `OPENAI_API_KEY` is required. `OPENAI_BASE_URL`, `ANALYSIS_TIMEOUT_SECS`
    /// and `ANALYSIS_MODEL_*` override the defaults.
    pub fn from_env() -> AnalysisResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> AnalysisResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("OPENAI_API_KEY")
            .ok_or_else(|| AnalysisError::config("OPENAI_API_KEY environment variable not set"))?;

        let timeout = match non_empty("ANALYSIS_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AnalysisError::config(format!("ANALYSIS_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                if secs == 0 {
                    return Err(AnalysisError::config("ANALYSIS_TIMEOUT_SECS must be positive"));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let defaults = ModelCatalog::default();
        let models = ModelCatalog {
            primary: non_empty("ANALYSIS_MODEL_PRIMARY").unwrap_or(defaults.primary),
            primary_fast: non_empty("ANALYSIS_MODEL_PRIMARY_FAST").unwrap_or(defaults.primary_fast),
            fallback: non_empty("ANALYSIS_MODEL_FALLBACK").unwrap_or(defaults.fallback),
            fallback_fast: non_empty("ANALYSIS_MODEL_FALLBACK_FAST")
                .unwrap_or(defaults.fallback_fast),
        };

        Ok(Self {
            api_key,
            base_url: non_empty("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
            models,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = AiConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.kind(), "config");

        let err = AiConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_defaults_apply() {
        let config = AiConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.models, ModelCatalog::default());
    }

    #[test]
    fn test_overrides_apply() {
        let config = AiConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("ANALYSIS_TIMEOUT_SECS", "5"),
            ("ANALYSIS_MODEL_FALLBACK_FAST", "local-small"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.models.resolve(Model::FallbackFast), "local-small");
        assert_eq!(config.models.resolve(Model::Primary), "gpt-5");
    }

    #[test]
    fn test_bad_timeout_rejected() {
        for raw in ["soon", "0"] {
            let err = AiConfig::from_lookup(lookup(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("ANALYSIS_TIMEOUT_SECS", raw),
            ]))
            .unwrap_err();
            assert_eq!(err.kind(), "config");
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AiConfig::new("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
