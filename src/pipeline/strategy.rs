//! Extraction strategy selection.
//!
//! `Rules` never leaves the process. `Model` talks to Ollama and falls back to
//! `Rules` on any failure, so both strategies always produce a list.

use std::fmt;
use std::str::FromStr;

use crate::config::ExtractorConfig;
use crate::pipeline::action_items::{
    ActionItemExtractor, ActionItemList, ModelExtractor, OllamaClient, RuleBasedExtractor,
};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionStrategy {
    /// Deterministic line classifier.
    #[default]
    Rules,
    /// Local model with rule-based fallback.
    Model,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules => write!(f, "rules"),
            Self::Model => write!(f, "model"),
        }
    }
}

impl FromStr for ExtractionStrategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rules" | "rule" => Ok(Self::Rules),
            "model" | "llm" => Ok(Self::Model),
            other => Err(format!("Invalid extraction strategy: {other}")),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Resolution
// ═══════════════════════════════════════════════════════════

impl ExtractionStrategy {
    pub fn all() -> &'static [ExtractionStrategy] {
        &[Self::Rules, Self::Model]
    }

    /// Build the extractor for this strategy.
    ///
    /// If the HTTP client for `Model` cannot be built, the rule-based
    /// extractor is returned instead.
    pub fn extractor(self, config: &ExtractorConfig) -> Box<dyn ActionItemExtractor> {
        match self {
            Self::Rules => Box::new(RuleBasedExtractor::new()),
            Self::Model => match OllamaClient::from_config(config) {
                Ok(client) => Box::new(ModelExtractor::new(Box::new(client), &config.model)),
                Err(e) => {
                    tracing::warn!(error = %e, "Ollama client unavailable, using rule-based extraction");
                    Box::new(RuleBasedExtractor::new())
                }
            },
        }
    }

    /// Extract with settings taken from the environment.
    pub fn extract(self, text: &str) -> ActionItemList {
        self.extract_with(&ExtractorConfig::from_env(), text)
    }

    pub fn extract_with(self, config: &ExtractorConfig, text: &str) -> ActionItemList {
        tracing::debug!(strategy = %self, "extracting action items");
        self.extractor(config).extract(text)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> ExtractorConfig {
        // Port 9 (discard) on loopback is closed in test environments.
        ExtractorConfig {
            model: "llama3.2-vision".into(),
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for strategy in ExtractionStrategy::all() {
            let parsed: ExtractionStrategy = strategy.to_string().parse().unwrap();
            assert_eq!(parsed, *strategy);
        }
    }

    #[test]
    fn from_str_accepts_aliases() {
        assert_eq!("llm".parse::<ExtractionStrategy>(), Ok(ExtractionStrategy::Model));
        assert_eq!(" Model ".parse::<ExtractionStrategy>(), Ok(ExtractionStrategy::Model));
        assert_eq!("RULES".parse::<ExtractionStrategy>(), Ok(ExtractionStrategy::Rules));
    }

    #[test]
    fn from_str_rejects_unknown() {
        let err = "magic".parse::<ExtractionStrategy>().unwrap_err();
        assert!(err.contains("magic"));
    }

    #[test]
    fn default_is_rules() {
        assert_eq!(ExtractionStrategy::default(), ExtractionStrategy::Rules);
    }

    #[test]
    fn rules_strategy_extracts() {
        let items = ExtractionStrategy::Rules
            .extract_with(&unreachable_config(), "TODO: book venue\nchit chat");
        assert_eq!(items, vec!["TODO: book venue"]);
    }

    #[test]
    fn model_strategy_empty_input_is_empty() {
        let items = ExtractionStrategy::Model.extract_with(&unreachable_config(), "   ");
        assert!(items.is_empty());
    }

    #[test]
    fn extractors_agree_on_empty_input() {
        let config = unreachable_config();
        for strategy in ExtractionStrategy::all() {
            assert!(strategy.extractor(&config).extract("").is_empty());
        }
    }
}
