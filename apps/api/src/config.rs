use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails fast if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    /// Directory where uploaded resume files are written before processing.
    pub upload_dir: String,
    /// When true, the LLM-backed field extractor replaces the heuristic one.
    pub enable_llm_extraction: bool,
    /// Upper bound on concurrently processed documents in one upload batch.
    /// Kept small to respect external API rate limits, not for throughput.
    pub batch_workers: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "media/resumes".to_string()),
            enable_llm_extraction: std::env::var("ENABLE_LLM_EXTRACTION")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            batch_workers: std::env::var("BATCH_WORKERS")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<usize>()
                .context("BATCH_WORKERS must be a positive integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
