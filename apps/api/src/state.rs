use sqlx::PgPool;

use crate::config::Config;
use crate::screening::Screener;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The screening pipeline's collaborators (store, field extractor, embedder,
/// LLM client) are explicitly constructed at startup and bound inside the
/// `Screener` — never resolved through process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub screener: Screener,
}
