//! Screening pipeline: extract → prompt → score for every resume in parallel, then rank.

pub mod handlers;
pub mod session;

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::extraction::{self, ExtractionSettings};
use crate::models::screening::{JobDescription, ResumeDocument, ScoreResult};
use crate::prompting::build_prompt;
use crate::ranking::{aggregate, RankedResultSet};
use crate::scoring::{ScoringClient, ScoringFailure};

pub struct Screener {
    extraction: ExtractionSettings,
    scoring: ScoringClient,
    max_chars: usize,
}

impl Screener {
    pub fn new(extraction: ExtractionSettings, scoring: ScoringClient, max_chars: usize) -> Self {
        Self {
            extraction,
            scoring,
            max_chars,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.scoring.backend_name()
    }

    /// Screens a batch and returns one ranked row per document.
    ///
    /// Dropping the returned future aborts every in-flight extraction and backend call.
    pub async fn screen(self: Arc<Self>, documents: Vec<ResumeDocument>, jd: JobDescription) -> RankedResultSet {
        let run_id = Uuid::new_v4();
        let span = info_span!("screening_run", %run_id, files = documents.len());
        self.run(documents, Arc::new(jd)).instrument(span).await
    }

    async fn run(self: Arc<Self>, documents: Vec<ResumeDocument>, jd: Arc<JobDescription>) -> RankedResultSet {
        let filenames: Vec<String> = documents.iter().map(|d| d.filename.clone()).collect();
        info!("Screening {} resumes with {}", documents.len(), self.backend_name());

        let mut tasks = JoinSet::new();
        for (index, document) in documents.into_iter().enumerate() {
            let screener = Arc::clone(&self);
            let jd = Arc::clone(&jd);
            tasks.spawn(
                async move { (index, screener.screen_one(document, &jd).await) }.in_current_span(),
            );
        }

        // Completion order is arbitrary; slot results back by upload index.
        let mut slots: Vec<Option<ScoreResult>> = vec![None; filenames.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!("Screening task failed: {e}"),
            }
        }

        let results = slots
            .into_iter()
            .zip(&filenames)
            .map(|(slot, file)| {
                slot.unwrap_or_else(|| {
                    ScoringFailure::Internal("task did not complete".to_string())
                        .into_fallback(file)
                })
            })
            .collect();

        let ranked = aggregate(results);
        info!("Screening finished: {} rows", ranked.len());
        ranked
    }

    async fn screen_one(&self, document: ResumeDocument, jd: &JobDescription) -> ScoreResult {
        let extracted = extraction::extract(document, &self.extraction).await;
        if !extracted.has_signal() {
            warn!("No readable text in {}; skipping the backend", extracted.filename);
            return self.scoring.no_content(&extracted);
        }

        let prompt = build_prompt(jd, &extracted, self.max_chars);
        self.scoring.score(&extracted.filename, &prompt).await
    }
}
