mod cli;
mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod prompting;
mod ranking;
mod routes;
mod scoring;
mod screening;
mod selections;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::build_backend;
use crate::routes::build_router;
use crate::scoring::ScoringClient;
use crate::screening::Screener;
use crate::selections::{MemorySelectionStore, PgSelectionStore, SelectionStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing or malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", module_path!(), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    // Initialize scoring backend (chosen once, shared by every request)
    let backend = build_backend(&config.backend)?;
    info!(
        "Scoring backend: {} (model: {})",
        backend.name(),
        config.backend.model
    );
    let scoring = ScoringClient::new(backend, config.scoring.clone());
    let screener = Screener::new(config.extraction.clone(), scoring, config.max_prompt_chars);

    match cli.command {
        Some(Command::Screen(args)) => {
            cli::run_screen(Arc::new(screener), &args, config.max_upload_bytes).await
        }
        Some(Command::Serve) | None => serve(config, screener).await,
    }
}

async fn serve(config: Config, screener: Screener) -> Result<()> {
    // Initialize selection store
    let selections: Arc<dyn SelectionStore> = match &config.database_url {
        Some(url) => Arc::new(PgSelectionStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; selections are kept in memory and lost on restart");
            Arc::new(MemorySelectionStore::new())
        }
    };
    info!("Selection store: {}", selections.name());

    let port = config.port;
    let state = AppState::new(config, screener, selections);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
