//! LLM Client — the scoring backends behind one request/response contract.
//!
//! Every backend receives a system prompt plus a user prompt and returns the model's
//! raw text. Parsing, retries, timeouts and fallbacks live in `scoring`, so adapters stay
//! thin and interchangeable. The backend is chosen once at startup from `BackendConfig`.

pub mod anthropic;
pub mod keyword;
pub mod ollama;
pub mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

pub use anthropic::AnthropicBackend;
pub use keyword::KeywordBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

/// Output token ceiling for every backend that accepts one.
pub const MAX_TOKENS: u32 = 2048;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("prompt is missing the {0} section")]
    InvalidPrompt(&'static str),

    #[error("backend misconfigured: {0}")]
    Config(String),
}

impl LlmError {
    /// Rate limits, server errors and connection problems are worth one more try.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A scoring backend. Implement this to add a provider without touching the pipeline.
///
/// Carried in `AppState` (inside `ScoringClient`) as `Arc<dyn ScoringBackend>`.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// Short label for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Sends one prompt and returns the model's raw text answer.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Backend configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OpenAI-compatible chat completions: Groq, OpenAI, or a local llama.cpp / vLLM server.
    OpenAi,
    Anthropic,
    /// Local Ollama inference server.
    Ollama,
    /// Offline keyword-coverage scorer, no model at all.
    Keyword,
}

impl BackendKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "llama-3.3-70b-versatile",
            BackendKind::Anthropic => "claude-sonnet-4-5",
            BackendKind::Ollama => "llama3:8b",
            BackendKind::Keyword => "keyword-coverage",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "https://api.groq.com/openai/v1",
            BackendKind::Anthropic => "https://api.anthropic.com/v1",
            BackendKind::Ollama => "http://localhost:11434",
            BackendKind::Keyword => "",
        }
    }

    /// Hosted APIs refuse anonymous calls; local servers usually don't care.
    pub fn requires_api_key(&self, base_url: &str) -> bool {
        match self {
            BackendKind::OpenAi | BackendKind::Anthropic => !is_local_url(base_url),
            BackendKind::Ollama | BackendKind::Keyword => false,
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "groq" => Ok(BackendKind::OpenAi),
            "anthropic" | "claude" => Ok(BackendKind::Anthropic),
            "ollama" => Ok(BackendKind::Ollama),
            "keyword" => Ok(BackendKind::Keyword),
            other => Err(format!(
                "unknown scoring backend '{other}' (expected openai, anthropic, ollama or keyword)"
            )),
        }
    }
}

#[derive(Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Upper bound for one HTTP exchange; the scoring client applies its own deadline too.
    pub request_timeout: Duration,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl BackendConfig {
    /// Config with the kind's default model and URL.
    pub fn for_kind(kind: BackendKind) -> Self {
        Self {
            kind,
            model: kind.default_model().to_string(),
            base_url: kind.default_base_url().to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Builds the configured backend. Called once at startup.
pub fn build_backend(config: &BackendConfig) -> Result<Arc<dyn ScoringBackend>, LlmError> {
    if config.kind.requires_api_key(&config.base_url) && config.api_key.is_none() {
        return Err(LlmError::Config(format!(
            "an API key is required for {}",
            config.base_url
        )));
    }
    Ok(match config.kind {
        BackendKind::OpenAi => Arc::new(OpenAiBackend::new(config)?),
        BackendKind::Anthropic => Arc::new(AnthropicBackend::new(config)?),
        BackendKind::Ollama => Arc::new(OllamaBackend::new(config)?),
        BackendKind::Keyword => Arc::new(KeywordBackend),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Shared HTTP helpers
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn http_client(timeout: Duration) -> Result<Client, LlmError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Turns a non-2xx response into `LlmError::Api`, otherwise decodes the JSON body.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
    extract_message: fn(&str) -> Option<String>,
) -> Result<T, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("LLM API returned {status}");
        let message = extract_message(&body).unwrap_or(body);
        return Err(LlmError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}

fn is_local_url(url: &str) -> bool {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|host| {
                matches!(host, "localhost" | "127.0.0.1" | "0.0.0.0" | "[::1]")
                    || host.ends_with(".local")
            })
        })
        .unwrap_or(false)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("groq".parse::<BackendKind>(), Ok(BackendKind::OpenAi));
        assert_eq!("Anthropic".parse::<BackendKind>(), Ok(BackendKind::Anthropic));
        assert_eq!(" ollama ".parse::<BackendKind>(), Ok(BackendKind::Ollama));
        assert_eq!("keyword".parse::<BackendKind>(), Ok(BackendKind::Keyword));
        assert!("gpt".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_hosted_backends_need_a_key() {
        let config = BackendConfig::for_kind(BackendKind::OpenAi);
        assert!(matches!(build_backend(&config), Err(LlmError::Config(_))));

        let mut local = BackendConfig::for_kind(BackendKind::OpenAi);
        local.base_url = "http://localhost:8000/v1".to_string();
        assert!(build_backend(&local).is_ok());
    }

    #[test]
    fn test_local_url_detection() {
        assert!(is_local_url("http://localhost:11434"));
        assert!(is_local_url("http://127.0.0.1:8000/v1"));
        assert!(is_local_url("http://[::1]:8000"));
        assert!(!is_local_url("https://api.groq.com/openai/v1"));
        assert!(!is_local_url("not a url"));
    }

    #[test]
    fn test_selected_backend_reports_its_name() {
        let backend = build_backend(&BackendConfig::for_kind(BackendKind::Ollama)).unwrap();
        assert_eq!(backend.name(), "ollama");
        let backend = build_backend(&BackendConfig::for_kind(BackendKind::Keyword)).unwrap();
        assert_eq!(backend.name(), "keyword");
    }

    #[test]
    fn test_debug_output_redacts_api_key() {
        let mut config = BackendConfig::for_kind(BackendKind::Anthropic);
        config.api_key = Some("sk-secret".to_string());
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Api { status: 429, message: String::new() }.is_transient());
        assert!(LlmError::Api { status: 503, message: String::new() }.is_transient());
        assert!(!LlmError::Api { status: 401, message: String::new() }.is_transient());
        assert!(!LlmError::EmptyContent.is_transient());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://api.groq.com/openai/v1/", "/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }
}
