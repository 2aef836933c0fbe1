//! Environment-driven engine configuration.
//!
//! Settings resolve from the process environment (a `.env` file is honored
//! via dotenvy), falling back to defaults that mirror the reference corpus
//! deployment. All variables share the `ANSWERSMITH_` prefix.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::EngineError;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Manifest URLs, each resolving to a JSON array of corpus page URLs.
    pub manifest_urls: Vec<String>,
    /// SQLite database holding consolidated records.
    pub db_path: PathBuf,
    /// Where the vector index blob is persisted.
    pub index_path: PathBuf,
    pub embedding_endpoint: String,
    pub embedding_model: String,
    pub chat_endpoint: String,
    pub chat_model: String,
    pub api_key: Option<String>,
    /// Question groups per ingestion batch.
    pub qids_per_batch: usize,
    /// Records per storage page during index builds.
    pub page_size: u64,
    /// Chunks per embedding call.
    pub embed_batch_size: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Neighbors retrieved per query.
    pub top_k: usize,
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manifest_urls: Vec::new(),
            db_path: PathBuf::from("answersmith.db"),
            index_path: PathBuf::from("answersmith_index.json"),
            embedding_endpoint: "http://localhost:8000/v1".to_string(),
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            chat_endpoint: "http://localhost:8000/v1".to_string(),
            chat_model: "gemini-1.5-flash".to_string(),
            api_key: None,
            qids_per_batch: 20_000,
            page_size: 5_000,
            embed_batch_size: 512,
            chunk_size: 2_000,
            chunk_overlap: 400,
            top_k: 5,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Resolves the configuration from the environment, keeping defaults
    /// for anything unset. Unparseable numeric values are validation errors
    /// rather than silent fallbacks.
    pub fn from_env() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Ok(Self {
            manifest_urls: std::env::var("ANSWERSMITH_MANIFEST_URLS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|entry| !entry.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.manifest_urls),
            db_path: path_var("ANSWERSMITH_DB_PATH", defaults.db_path),
            index_path: path_var("ANSWERSMITH_INDEX_PATH", defaults.index_path),
            embedding_endpoint: string_var(
                "ANSWERSMITH_EMBEDDING_ENDPOINT",
                defaults.embedding_endpoint,
            ),
            embedding_model: string_var("ANSWERSMITH_EMBEDDING_MODEL", defaults.embedding_model),
            chat_endpoint: string_var("ANSWERSMITH_CHAT_ENDPOINT", defaults.chat_endpoint),
            chat_model: string_var("ANSWERSMITH_CHAT_MODEL", defaults.chat_model),
            api_key: std::env::var("ANSWERSMITH_API_KEY").ok(),
            qids_per_batch: numeric_var("ANSWERSMITH_QIDS_PER_BATCH", defaults.qids_per_batch)?,
            page_size: numeric_var("ANSWERSMITH_PAGE_SIZE", defaults.page_size)?,
            embed_batch_size: numeric_var(
                "ANSWERSMITH_EMBED_BATCH_SIZE",
                defaults.embed_batch_size,
            )?,
            chunk_size: numeric_var("ANSWERSMITH_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: numeric_var("ANSWERSMITH_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: numeric_var("ANSWERSMITH_TOP_K", defaults.top_k)?,
            request_timeout: Duration::from_secs(numeric_var(
                "ANSWERSMITH_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
        })
    }
}

fn string_var(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn path_var(name: &str, default: PathBuf) -> PathBuf {
    std::env::var(name).map(PathBuf::from).unwrap_or(default)
}

fn numeric_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, EngineError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            EngineError::Validation(format!("{name} has a non-numeric value: '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}
