//! Shared error taxonomy for the ingestion, indexing, and answering pipelines.

use thiserror::Error;

/// Errors surfaced by the pipeline and retrieval components.
///
/// Long-running jobs (ingestion, index builds) catch these at their outer
/// boundary and convert them into a terminal [`TaskStatus::Failure`] report;
/// the synchronous answering path returns them directly to the caller.
///
/// [`TaskStatus::Failure`]: crate::ingestion::TaskStatus::Failure
#[derive(Debug, Error)]
pub enum EngineError {
    /// A network fetch failed (corpus manifests, pages, or remote services).
    #[error("transport error: {0}")]
    Transport(String),

    /// Caller-supplied input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The record store holds zero records; ingestion must run first.
    #[error("no records found in the corpus store")]
    EmptyCorpus,

    /// Every page of the corpus cleaned down to nothing, so no index exists.
    #[error("no embeddable chunks were produced; the index was not built")]
    IndexNotBuilt,

    /// Record-store failure, including unique-key constraint violations.
    #[error("storage error: {0}")]
    Storage(String),

    /// The embedding service failed or returned a malformed response.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The generative completion service failed or returned nothing usable.
    #[error("completion error: {0}")]
    Completion(String),

    /// Vector-index construction, lookup, or persistence failure.
    #[error("index error: {0}")]
    Index(String),

    /// The run observed the caller's cancellation flag between batches.
    #[error("run cancelled by caller")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Transport(err.to_string())
    }
}
