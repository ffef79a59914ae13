//! Scoring Client — calls the configured backend once per resume and always returns a
//! `ScoreResult`.
//!
//! Failure policy, per resume:
//! - transient backend error → up to `max_retries` retries with exponential backoff
//! - timeout or permanent backend error → fallback result
//! - malformed answer → one re-ask with the strict suffix, then fallback result
//!
//! A fallback result has score 0, `hard_filter_pass=false`, no reasons, and an
//! explanation saying what went wrong. It never aborts the batch.

pub mod schema;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{LlmError, ScoringBackend};
use crate::models::screening::{ExtractedText, ScoreResult};
use crate::prompting::prompts::SCREENING_SYSTEM;
use crate::prompting::strict_prompt;
use crate::scoring::schema::parse_score_response;

/// Why a resume ended up with a fallback result.
#[derive(Debug, Error)]
pub enum ScoringFailure {
    #[error("the scoring backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("the scoring backend failed: {0}")]
    Backend(#[from] LlmError),

    #[error("the scoring backend returned an unparseable response ({0})")]
    Malformed(String),

    #[error("screening this file failed unexpectedly ({0})")]
    Internal(String),

    /// Carries an optional note on whether OCR ran.
    #[error("no readable text could be extracted from this file{0}")]
    NoContent(&'static str),
}

impl ScoringFailure {
    /// The degraded row shown in place of a real score.
    pub fn into_fallback(self, file: &str) -> ScoreResult {
        let explanation = format!("Not scored: {self}. Score set to 0.");
        ScoreResult {
            file: file.to_string(),
            candidate_name: None,
            final_score: 0.0,
            hard_filter_pass: false,
            explanation,
            top_reasons: vec![],
            ..ScoreResult::default()
        }
    }
}

/// Upper bound for a single retry sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff: base, 2×base, 4×base ..., capped at `MAX_BACKOFF`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt))
        .unwrap_or(Duration::MAX)
        .min(MAX_BACKOFF)
}

#[derive(Debug, Clone)]
pub struct ScoringSettings {
    /// Deadline for each backend call.
    pub timeout: Duration,
    /// Retries for transient errors (rate limits, 5xx, connection failures).
    pub max_retries: u32,
    /// First backoff delay; doubles per retry.
    pub retry_backoff: Duration,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 1,
            retry_backoff: Duration::from_millis(1000),
        }
    }
}

#[derive(Clone)]
pub struct ScoringClient {
    backend: Arc<dyn ScoringBackend>,
    settings: ScoringSettings,
}

impl ScoringClient {
    pub fn new(backend: Arc<dyn ScoringBackend>, settings: ScoringSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Scores one prompt. Never fails; problems become a fallback result.
    pub async fn score(&self, file: &str, prompt: &str) -> ScoreResult {
        match self.try_score(file, prompt).await {
            Ok(result) => result,
            Err(failure) => {
                warn!("Scoring fell back for {file}: {failure}");
                failure.into_fallback(file)
            }
        }
    }

    /// Fallback row for a file whose extraction produced nothing to score.
    pub fn no_content(&self, extracted: &ExtractedText) -> ScoreResult {
        let note = if extracted.used_ocr { " (OCR was attempted)" } else { "" };
        ScoringFailure::NoContent(note).into_fallback(&extracted.filename)
    }

    async fn try_score(&self, file: &str, prompt: &str) -> Result<ScoreResult, ScoringFailure> {
        let raw = self.call_with_retry(prompt).await?;
        match parse_score_response(file, &raw) {
            Ok(result) => return Ok(result),
            Err(reason) => debug!("Malformed answer for {file} ({reason}); re-asking strictly"),
        }

        let raw = self.call_with_retry(&strict_prompt(prompt)).await?;
        parse_score_response(file, &raw).map_err(ScoringFailure::Malformed)
    }

    async fn call_with_retry(&self, prompt: &str) -> Result<String, ScoringFailure> {
        let mut attempt = 0;
        loop {
            let call = self.backend.complete(SCREENING_SYSTEM, prompt);
            let error = match tokio::time::timeout(self.settings.timeout, call).await {
                Err(_) => return Err(ScoringFailure::Timeout(self.settings.timeout)),
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => e,
            };

            if !error.is_transient() || attempt >= self.settings.max_retries {
                return Err(error.into());
            }

            let delay = backoff_delay(self.settings.retry_backoff, attempt);
            warn!(
                "{} call attempt {} failed ({error}), retrying after {}ms...",
                self.backend.name(),
                attempt + 1,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// What the scripted backend does on one call.
    pub enum Reply {
        Text(String),
        Fail(LlmError),
        Hang,
    }

    /// Backend that replays a script of replies and records every prompt it saw.
    pub struct ScriptedBackend {
        replies: Mutex<VecDeque<Reply>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        pub fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ScoringBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                Some(Reply::Text(text)) => Ok(text),
                Some(Reply::Fail(e)) => Err(e),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(LlmError::EmptyContent)
                }
                None => Err(LlmError::EmptyContent),
            }
        }
    }

    pub fn fast_settings() -> ScoringSettings {
        ScoringSettings {
            timeout: Duration::from_secs(5),
            max_retries: 1,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{fast_settings, Reply, ScriptedBackend};
    use super::*;
    use crate::prompting::prompts::STRICT_SUFFIX;

    fn rate_limited() -> LlmError {
        LlmError::Api {
            status: 429,
            message: "slow down".to_string(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
        assert_eq!(backoff_delay(base, 40), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::MAX, 1), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::from_secs(u64::MAX / 2), 5), MAX_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_backoff_setting_does_not_panic() {
        let backend = ScriptedBackend::new(vec![
            Reply::Fail(rate_limited()),
            Reply::Fail(rate_limited()),
            Reply::Fail(rate_limited()),
        ]);
        let settings = ScoringSettings {
            max_retries: 2,
            retry_backoff: Duration::MAX,
            ..fast_settings()
        };
        let client = ScoringClient::new(backend.clone(), settings);
        let result = client.score("a.pdf", "prompt").await;
        assert_eq!(result.final_score, 0.0);
        assert_eq!(backend.calls(), 3);
    }

    fn assert_fallback(result: &ScoreResult, needle: &str) {
        assert_eq!(result.final_score, 0.0);
        assert!(!result.hard_filter_pass);
        assert!(result.top_reasons.is_empty());
        assert!(
            result.explanation.contains(needle),
            "explanation {:?} should mention {needle:?}",
            result.explanation
        );
    }

    #[tokio::test]
    async fn test_valid_answer_is_returned() {
        let backend = ScriptedBackend::new(vec![Reply::Text(
            r#"{"final_score": 91, "hard_filter_pass": true, "explanation": "great", "top_reasons": ["a"]}"#.to_string(),
        )]);
        let client = ScoringClient::new(backend.clone(), fast_settings());
        let result = client.score("a.pdf", "prompt").await;
        assert_eq!(result.final_score, 91.0);
        assert_eq!(result.file, "a.pdf");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_json_falls_back_after_strict_reask() {
        let backend = ScriptedBackend::new(vec![
            Reply::Text("Sure! The candidate looks strong.".to_string()),
            Reply::Text("Still not JSON".to_string()),
        ]);
        let client = ScoringClient::new(backend.clone(), fast_settings());
        let result = client.score("a.pdf", "prompt").await;
        assert_fallback(&result, "unparseable");
        assert_eq!(backend.calls(), 2);
        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[1].ends_with(STRICT_SUFFIX));
    }

    #[tokio::test]
    async fn test_strict_reask_can_recover() {
        let backend = ScriptedBackend::new(vec![
            Reply::Text(r#"{"explanation": "forgot the score"}"#.to_string()),
            Reply::Text(r#"{"final_score": 44, "explanation": "ok"}"#.to_string()),
        ]);
        let client = ScoringClient::new(backend, fast_settings());
        assert_eq!(client.score("a.pdf", "prompt").await.final_score, 44.0);
    }

    #[tokio::test]
    async fn test_transient_error_is_retried_once() {
        let backend = ScriptedBackend::new(vec![
            Reply::Fail(rate_limited()),
            Reply::Text(r#"{"final_score": 60}"#.to_string()),
        ]);
        let client = ScoringClient::new(backend.clone(), fast_settings());
        assert_eq!(client.score("a.pdf", "prompt").await.final_score, 60.0);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let backend = ScriptedBackend::new(vec![
            Reply::Fail(rate_limited()),
            Reply::Fail(rate_limited()),
            Reply::Text(r#"{"final_score": 60}"#.to_string()),
        ]);
        let client = ScoringClient::new(backend.clone(), fast_settings());
        let result = client.score("a.pdf", "prompt").await;
        assert_fallback(&result, "429");
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Reply::Fail(LlmError::Api {
            status: 401,
            message: "bad key".to_string(),
        })]);
        let client = ScoringClient::new(backend.clone(), fast_settings());
        let result = client.score("a.pdf", "prompt").await;
        assert_fallback(&result, "bad key");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let backend = ScriptedBackend::new(vec![Reply::Hang]);
        let settings = ScoringSettings {
            timeout: Duration::from_secs(2),
            ..fast_settings()
        };
        let client = ScoringClient::new(backend.clone(), settings);
        let result = client.score("slow.pdf", "prompt").await;
        assert_fallback(&result, "did not answer");
        assert_eq!(result.file, "slow.pdf");
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_no_content_fallback_mentions_ocr() {
        let client = ScoringClient::new(ScriptedBackend::new(vec![]), fast_settings());
        let extracted = ExtractedText {
            filename: "scan.pdf".to_string(),
            text: String::new(),
            used_ocr: true,
        };
        let result = client.no_content(&extracted);
        assert_fallback(&result, "no readable text");
        assert!(result.explanation.contains("OCR was attempted"));
        assert_eq!(result.file, "scan.pdf");
    }
}
