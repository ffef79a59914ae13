use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::extraction::ocr::OcrSettings;
use crate::extraction::ExtractionSettings;
use crate::llm_client::{BackendConfig, BackendKind};
use crate::prompting::DEFAULT_MAX_CHARS;
use crate::scoring::ScoringSettings;

/// Application configuration loaded from environment variables.
/// Startup fails with a named variable if anything is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Unset → selections are kept in memory for the life of the process.
    pub database_url: Option<String>,
    pub backend: BackendConfig,
    pub scoring: ScoringSettings,
    pub extraction: ExtractionSettings,
    pub max_prompt_chars: usize,
    pub max_upload_bytes: usize,
    pub screen_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let kind: BackendKind = match env.get("SCORING_BACKEND") {
            Some(raw) => raw
                .parse()
                .map_err(anyhow::Error::msg)
                .context("SCORING_BACKEND is invalid")?,
            None => BackendKind::OpenAi,
        };
        let llm_timeout = Duration::from_secs(env.parse("LLM_TIMEOUT_SECS", 60u64)?);

        let mut backend = BackendConfig::for_kind(kind);
        if let Some(model) = env.get("LLM_MODEL") {
            backend.model = model;
        }
        if let Some(base_url) = env.get("LLM_BASE_URL") {
            backend.base_url = base_url;
        }
        backend.api_key = env.get("LLM_API_KEY").or_else(|| match kind {
            BackendKind::OpenAi => env.get("GROQ_API_KEY"),
            BackendKind::Anthropic => env.get("ANTHROPIC_API_KEY"),
            BackendKind::Ollama | BackendKind::Keyword => None,
        });
        backend.request_timeout = llm_timeout;
        if kind.requires_api_key(&backend.base_url) && backend.api_key.is_none() {
            bail!(
                "Required environment variable 'LLM_API_KEY' is not set (needed for {} at {})",
                kind.default_model(),
                backend.base_url
            );
        }

        let scoring = ScoringSettings {
            timeout: llm_timeout,
            max_retries: env.parse("LLM_MAX_RETRIES", 1u32)?,
            retry_backoff: Duration::from_millis(env.parse("LLM_RETRY_BACKOFF_MS", 1000u64)?),
        };

        let ocr_defaults = OcrSettings::default();
        let extraction = ExtractionSettings {
            ocr_enabled: env.flag("OCR_ENABLED", true)?,
            low_char_threshold: env.parse("OCR_LOW_CHAR_THRESHOLD", 200usize)?,
            ocr: OcrSettings {
                lang: env.get("OCR_LANG").unwrap_or(ocr_defaults.lang),
                dpi: env.parse("OCR_DPI", ocr_defaults.dpi)?,
                timeout: Duration::from_secs(env.parse("OCR_TIMEOUT_SECS", 60u64)?),
                pdftoppm_bin: env.get("PDFTOPPM_BIN").unwrap_or(ocr_defaults.pdftoppm_bin),
                tesseract_bin: env.get("TESSERACT_BIN").unwrap_or(ocr_defaults.tesseract_bin),
            },
        };

        let max_prompt_chars = env.parse("MAX_PROMPT_CHARS", DEFAULT_MAX_CHARS)?;
        if max_prompt_chars == 0 {
            bail!("MAX_PROMPT_CHARS must be greater than zero");
        }

        Ok(Config {
            port: env.parse("PORT", 8080u16)?,
            rust_log: env.get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            database_url: env.get("DATABASE_URL"),
            backend,
            scoring,
            extraction,
            max_prompt_chars,
            max_upload_bytes: env.parse("MAX_UPLOAD_BYTES", 10 * 1024 * 1024usize)?,
            screen_timeout: Duration::from_secs(env.parse("SCREEN_TIMEOUT_SECS", 300u64)?),
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Blank values count as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{e}"))
                .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
            None => Ok(default),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key).map(|v| v.to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => bail!("{key} must be true/false, 1/0 or yes/no, got '{v}'"),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use super::Config;

    /// Config from a fixed set of variables instead of the process environment.
    pub fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    /// Keyword backend, in-memory store, no OCR.
    pub fn offline_config() -> Config {
        config_from(&[("SCORING_BACKEND", "keyword"), ("OCR_ENABLED", "false")])
            .expect("offline config is valid")
    }
}
