//! Selection Store — durable reviewer decisions, independent of any screening run.
//!
//! `save_selections` is an upsert keyed by `(file, candidate_name or "")`: a later save for
//! the same key replaces the whole record. Each batch is applied all-or-nothing.

pub mod handlers;
pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::selection::{SelectionKey, SelectionRecord};

pub use memory::MemorySelectionStore;
pub use postgres::PgSelectionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid selection: {0}")]
    Validation(String),

    #[error("selection store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Returned by a successful save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveAck {
    pub status: &'static str,
    /// Unique records written after in-batch duplicates collapsed.
    pub saved: usize,
    pub saved_at: DateTime<Utc>,
}

impl SaveAck {
    pub fn ok(saved: usize) -> Self {
        Self {
            status: "ok",
            saved,
            saved_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait SelectionStore: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    async fn save_selections(&self, records: Vec<SelectionRecord>) -> Result<SaveAck, StoreError>;

    /// Every stored record, in no particular order.
    async fn load_selections(&self) -> Result<Vec<SelectionRecord>, StoreError>;
}

/// Validates, sanitizes and deduplicates a batch before any write.
///
/// Duplicate keys collapse to the last occurrence, keeping the position of the first.
pub fn prepare_batch(
    records: Vec<SelectionRecord>,
) -> Result<Vec<(SelectionKey, SelectionRecord)>, StoreError> {
    let mut batch: Vec<(SelectionKey, SelectionRecord)> = Vec::with_capacity(records.len());
    let mut positions: HashMap<SelectionKey, usize> = HashMap::new();

    for (index, record) in records.into_iter().enumerate() {
        if record.file.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "selection #{} has an empty file name",
                index + 1
            )));
        }
        if record.final_score.is_some_and(|s| !s.is_finite()) {
            return Err(StoreError::Validation(format!(
                "selection for '{}' has a non-finite score",
                record.file
            )));
        }

        let record = record.sanitized();
        let key = record.key();
        match positions.get(&key) {
            Some(&at) => batch[at].1 = record,
            None => {
                positions.insert(key.clone(), batch.len());
                batch.push((key, record));
            }
        }
    }

    Ok(batch)
}
