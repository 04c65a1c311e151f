pub mod cli;
pub mod config;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

use config::ExtractorConfig;
use pipeline::action_items::{ActionItemExtractor, RuleBasedExtractor};
use pipeline::strategy::ExtractionStrategy;

/// Install a stderr `fmt` subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    init_tracing_with(&config::default_log_filter());
}

/// Same as `init_tracing`, with an explicit fallback filter.
///
/// A second call is a no-op.
pub fn init_tracing_with(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Rule-based extraction. Pure, never fails.
pub fn extract_action_items(text: &str) -> Vec<String> {
    RuleBasedExtractor::new().extract(text)
}

/// Model-backed extraction against the Ollama instance named by the
/// environment, falling back to `extract_action_items` on any failure.
pub fn extract_action_items_via_model(text: &str) -> Vec<String> {
    ExtractionStrategy::Model.extract(text)
}

pub fn extract_action_items_via_model_with(config: &ExtractorConfig, text: &str) -> Vec<String> {
    ExtractionStrategy::Model.extract_with(config, text)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
