use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use super::types::{ChatClient, ChatMessage, ChatResponse};
use super::ExtractionError;
use crate::config::{ExtractorConfig, DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT_SECS};

/// Ollama HTTP client for schema-constrained chat completions.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at an Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractionError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    /// Default Ollama instance at localhost:11434 with 5-minute timeout.
    pub fn default_local() -> Result<Self, ExtractionError> {
        Self::new(DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT_SECS)
    }

    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractionError> {
        Self::new(&config.base_url, config.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> ExtractionError {
        if e.is_connect() {
            ExtractionError::OllamaConnection(self.base_url.clone())
        } else if e.is_timeout() {
            ExtractionError::HttpClient(format!(
                "Request timed out after {}s",
                self.timeout_secs
            ))
        } else {
            ExtractionError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/chat
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    format: &'a serde_json::Value,
    stream: bool,
}

impl ChatClient for OllamaClient {
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        format: &serde_json::Value,
    ) -> Result<ChatResponse, ExtractionError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model,
            messages,
            format,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ChatResponse>()
            .map_err(|e| ExtractionError::ResponseParsing(e.to_string()))
    }
}

/// One scripted reply from `MockChatClient`.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful chat with this message content.
    Content(String),
    /// Transport failure (`OllamaConnection`).
    Unreachable,
    /// Non-success HTTP status (`OllamaError`).
    Status(u16, String),
}

/// A chat call as seen by `MockChatClient`.
#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub format: serde_json::Value,
}

/// Mock chat client for testing. Replays a script, repeating the last reply.
pub struct MockChatClient {
    replies: Vec<MockReply>,
    calls: AtomicUsize,
    recorded: Mutex<Vec<RecordedChat>>,
}

impl MockChatClient {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `content`.
    pub fn responding(content: &str) -> Self {
        Self::new(vec![MockReply::Content(content.to_string())])
    }

    /// Always fails at the transport level.
    pub fn unreachable() -> Self {
        Self::new(vec![MockReply::Unreachable])
    }

    /// Number of `chat` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every call received, in order.
    pub fn recorded(&self) -> Vec<RecordedChat> {
        self.recorded
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ChatClient for MockChatClient {
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        format: &serde_json::Value,
    ) -> Result<ChatResponse, ExtractionError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(RecordedChat {
                model: model.to_string(),
                messages: messages.to_vec(),
                format: format.clone(),
            });
        }

        let reply = self
            .replies
            .get(index)
            .or_else(|| self.replies.last())
            .cloned()
            .unwrap_or(MockReply::Unreachable);

        match reply {
            MockReply::Content(content) => Ok(ChatResponse::assistant(content)),
            MockReply::Unreachable => Err(ExtractionError::OllamaConnection("mock".into())),
            MockReply::Status(status, body) => Err(ExtractionError::OllamaError { status, body }),
        }
    }
}
