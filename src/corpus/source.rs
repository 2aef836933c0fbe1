//! Fetching raw Q&A rows, with an explicit in-memory dataset cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use url::Url;

use super::RawQARow;
use crate::types::EngineError;

/// Source of raw corpus rows, partitioned by question group.
///
/// Batching happens on unique `qid`s rather than rows so a question group is
/// never split across two ingestion batches.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Unique `qid`s in first-seen order, chunked into batches of at most
    /// `qids_per_batch`.
    async fn qid_batches(&self, qids_per_batch: usize)
        -> Result<Vec<Vec<String>>, EngineError>;

    /// Every raw row whose `qid` is in `qids`, in source order.
    async fn rows_for_qids(&self, qids: &[String]) -> Result<Vec<RawQARow>, EngineError>;

    /// Drops any dataset held in memory. Called by the pipeline once a run
    /// finishes so cached rows never outlive it.
    async fn clear_cache(&self);
}

/// Network-backed source: each manifest URL returns a JSON array of page
/// URLs, and each page returns a JSON array of [`RawQARow`]s.
///
/// The full row set is downloaded once per run and held behind an explicit
/// cache that the pipeline clears when it is done, so repeated batch lookups
/// do not refetch pages.
pub struct HttpCorpusSource {
    client: Client,
    manifest_urls: Vec<Url>,
    cache: Mutex<Option<Arc<Vec<RawQARow>>>>,
}

impl HttpCorpusSource {
    pub fn new(manifest_urls: Vec<Url>, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| EngineError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            manifest_urls,
            cache: Mutex::new(None),
        })
    }

    async fn ensure_loaded(&self) -> Result<Arc<Vec<RawQARow>>, EngineError> {
        let mut guard = self.cache.lock().await;
        if let Some(rows) = guard.as_ref() {
            return Ok(Arc::clone(rows));
        }

        let mut page_urls: Vec<Url> = Vec::new();
        for manifest in &self.manifest_urls {
            let response = self
                .client
                .get(manifest.clone())
                .send()
                .await?
                .error_for_status()?;
            let pages: Vec<String> = response.json().await?;
            for page in pages {
                let url = Url::parse(&page).map_err(|err| {
                    EngineError::Transport(format!("manifest entry '{page}' is not a URL: {err}"))
                })?;
                page_urls.push(url);
            }
        }
        tracing::info!(pages = page_urls.len(), "resolved corpus page manifest");

        let mut rows: Vec<RawQARow> = Vec::new();
        for page in page_urls {
            let response = self
                .client
                .get(page.clone())
                .send()
                .await?
                .error_for_status()?;
            let page_rows: Vec<RawQARow> = response.json().await?;
            tracing::debug!(url = %page, rows = page_rows.len(), "fetched corpus page");
            rows.extend(page_rows);
        }
        tracing::info!(rows = rows.len(), "corpus dataset loaded");

        let rows = Arc::new(rows);
        *guard = Some(Arc::clone(&rows));
        Ok(rows)
    }
}

#[async_trait]
impl CorpusSource for HttpCorpusSource {
    async fn qid_batches(
        &self,
        qids_per_batch: usize,
    ) -> Result<Vec<Vec<String>>, EngineError> {
        let rows = self.ensure_loaded().await?;
        Ok(batch_unique_qids(&rows, qids_per_batch))
    }

    async fn rows_for_qids(&self, qids: &[String]) -> Result<Vec<RawQARow>, EngineError> {
        let rows = self.ensure_loaded().await?;
        Ok(filter_rows(&rows, qids))
    }

    async fn clear_cache(&self) {
        let mut guard = self.cache.lock().await;
        if guard.take().is_some() {
            tracing::debug!("corpus dataset cache cleared");
        }
    }
}

/// In-memory source for tests and local experiments.
pub struct MemoryCorpusSource {
    rows: Vec<RawQARow>,
}

impl MemoryCorpusSource {
    pub fn new(rows: Vec<RawQARow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl CorpusSource for MemoryCorpusSource {
    async fn qid_batches(
        &self,
        qids_per_batch: usize,
    ) -> Result<Vec<Vec<String>>, EngineError> {
        Ok(batch_unique_qids(&self.rows, qids_per_batch))
    }

    async fn rows_for_qids(&self, qids: &[String]) -> Result<Vec<RawQARow>, EngineError> {
        Ok(filter_rows(&self.rows, qids))
    }

    async fn clear_cache(&self) {}
}

fn batch_unique_qids(rows: &[RawQARow], qids_per_batch: usize) -> Vec<Vec<String>> {
    let batch_size = qids_per_batch.max(1);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique: Vec<String> = Vec::new();
    for row in rows {
        if seen.insert(row.qid.as_str()) {
            unique.push(row.qid.clone());
        }
    }
    unique
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

fn filter_rows(rows: &[RawQARow], qids: &[String]) -> Vec<RawQARow> {
    let wanted: HashSet<&str> = qids.iter().map(String::as_str).collect();
    rows.iter()
        .filter(|row| wanted.contains(row.qid.as_str()))
        .cloned()
        .collect()
}
