use std::sync::Arc;

use crate::config::Config;
use crate::screening::Screener;
use crate::selections::SelectionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Extraction settings plus the scoring client; immutable after startup.
    pub screener: Arc<Screener>,
    /// Pluggable selection store. Postgres when DATABASE_URL is set, memory otherwise.
    pub selections: Arc<dyn SelectionStore>,
}

impl AppState {
    pub fn new(config: Config, screener: Screener, selections: Arc<dyn SelectionStore>) -> Self {
        Self {
            config,
            screener: Arc::new(screener),
            selections,
        }
    }
}
