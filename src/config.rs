/// Application-level constants
pub const APP_NAME: &str = "action-extract";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Model used when `OLLAMA_MODEL` is unset or blank.
pub const DEFAULT_MODEL: &str = "llama3.2-vision";

/// Local Ollama instance.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Per-request HTTP timeout for chat calls (5 minutes; CPU inference is slow).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub const MODEL_ENV: &str = "OLLAMA_MODEL";
pub const HOST_ENV: &str = "OLLAMA_HOST";
pub const TIMEOUT_ENV: &str = "OLLAMA_TIMEOUT_SECS";
pub const LOG_FILTER_ENV: &str = "ACTION_EXTRACT_LOG";

/// Log filter used when `RUST_LOG` is absent.
pub fn default_log_filter() -> String {
    non_blank(std::env::var(LOG_FILTER_ENV).ok()).unwrap_or_else(|| "info".to_string())
}

/// Settings for the model-backed extractor and its chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ExtractorConfig {
    /// Read `OLLAMA_MODEL`, `OLLAMA_HOST` and `OLLAMA_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank or unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model = non_blank(lookup(MODEL_ENV)).unwrap_or(defaults.model);
        let base_url = non_blank(lookup(HOST_ENV))
            .map(|host| normalize_base_url(&host))
            .unwrap_or(defaults.base_url);
        let timeout_secs = non_blank(lookup(TIMEOUT_ENV))
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.timeout_secs);

        Self {
            model,
            base_url,
            timeout_secs,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// `OLLAMA_HOST` may be a bare `host:port`; give it a scheme and drop trailing slashes.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
