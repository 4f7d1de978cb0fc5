mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod screening;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::extraction::fields::{FieldExtractor, HeuristicFieldExtractor};
use crate::extraction::llm::LlmFieldExtractor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::scoring::{Embedder, HashedEmbedder};
use crate::screening::Screener;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sift API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Field extractor: heuristic by default, LLM-backed via ENABLE_LLM_EXTRACTION
    let extractor: Arc<dyn FieldExtractor> = if config.enable_llm_extraction {
        Arc::new(LlmFieldExtractor::new(llm.clone()))
    } else {
        Arc::new(HeuristicFieldExtractor)
    };
    info!("Field extractor initialized (backend: {})", extractor.backend());

    // Embedding backend for relevance scoring
    let embedder: Arc<dyn Embedder> = Arc::new(HashedEmbedder::new());
    info!("Embedder initialized (backend: {})", embedder.backend());

    let screener = Screener::new(
        Arc::new(db.clone()),
        extractor,
        embedder,
        llm,
        config.batch_workers,
    );

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        screener,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
