//! In-process Selection Store, used when no database is configured and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::selection::{SelectionKey, SelectionRecord};
use crate::selections::{prepare_batch, SaveAck, SelectionStore, StoreError};

#[derive(Default)]
pub struct MemorySelectionStore {
    records: RwLock<HashMap<SelectionKey, SelectionRecord>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SelectionStore for MemorySelectionStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn save_selections(&self, records: Vec<SelectionRecord>) -> Result<SaveAck, StoreError> {
        // Validate the whole batch before taking the lock so a bad record writes nothing.
        let batch = prepare_batch(records)?;
        let saved = batch.len();

        let mut guard = self.records.write().await;
        for (key, record) in batch {
            guard.insert(key, record);
        }
        debug!("Stored {saved} selections ({} total)", guard.len());

        Ok(SaveAck::ok(saved))
    }

    async fn load_selections(&self) -> Result<Vec<SelectionRecord>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
