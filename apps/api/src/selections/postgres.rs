//! Postgres-backed Selection Store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::models::selection::{SelectionKey, SelectionRecord, SelectionRow};
use crate::selections::{prepare_batch, SaveAck, SelectionStore, StoreError};

/// Row locks must be taken in one global order, or two overlapping batches
/// sent in different orders deadlock each other.
fn in_lock_order(
    mut batch: Vec<(SelectionKey, SelectionRecord)>,
) -> Vec<(SelectionKey, SelectionRecord)> {
    batch.sort_by(|a, b| a.0.cmp(&b.0));
    batch
}

#[derive(Clone)]
pub struct PgSelectionStore {
    pool: PgPool,
}

impl PgSelectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SelectionStore for PgSelectionStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn save_selections(&self, records: Vec<SelectionRecord>) -> Result<SaveAck, StoreError> {
        let batch = in_lock_order(prepare_batch(records)?);
        let saved = batch.len();

        // One transaction per batch: a failure part-way rolls every upsert back.
        let mut tx = self.pool.begin().await?;
        for (key, record) in &batch {
            sqlx::query(
                r#"
                INSERT INTO selections
                    (file, candidate_key, candidate_name, final_score, hard_filter_pass,
                     explanation, top_reasons, manually_selected, manual_reason, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
                ON CONFLICT (file, candidate_key) DO UPDATE SET
                    candidate_name    = EXCLUDED.candidate_name,
                    final_score       = EXCLUDED.final_score,
                    hard_filter_pass  = EXCLUDED.hard_filter_pass,
                    explanation       = EXCLUDED.explanation,
                    top_reasons       = EXCLUDED.top_reasons,
                    manually_selected = EXCLUDED.manually_selected,
                    manual_reason     = EXCLUDED.manual_reason,
                    updated_at        = EXCLUDED.updated_at
                "#,
            )
            .bind(&key.file)
            .bind(&key.candidate_key)
            .bind(&record.candidate_name)
            .bind(record.final_score)
            .bind(record.hard_filter_pass)
            .bind(&record.explanation)
            .bind(&record.top_reasons)
            .bind(record.manually_selected)
            .bind(&record.manual_reason)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!("Upserted {saved} selections");
        Ok(SaveAck::ok(saved))
    }

    async fn load_selections(&self) -> Result<Vec<SelectionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SelectionRow>(
            r#"
            SELECT file, candidate_name, final_score, hard_filter_pass,
                   explanation, top_reasons, manually_selected, manual_reason
            FROM selections
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SelectionRecord::from).collect())
    }
}
