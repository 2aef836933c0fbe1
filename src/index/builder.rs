//! Streams persisted records through chunking, cleaning, and embedding into
//! the vector index, one bounded page at a time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::fs;

use super::flat::FlatIndex;
use super::{ChunkPayload, IndexEntry};
use crate::corpus::ConsolidatedRecord;
use crate::embeddings::Embedder;
use crate::ingestion::progress::{ProgressSink, TaskStatus};
use crate::stores::RecordStore;
use crate::text;
use crate::types::EngineError;

/// Joint between a record's question and its consolidated answers when
/// building the text to chunk.
const QUESTION_ANSWER_JOINT: &str = "\n\nAnswers:\n";

/// A chunk of one record's text, alive only until its sub-batch is embedded.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub parent_index: i64,
    pub metadata: String,
    pub raw_text: String,
    pub cleaned_text: String,
}

/// Knobs for one index build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Records fetched per storage page.
    pub page_size: u64,
    /// Chunks embedded per service call, bounding peak embedding memory
    /// independently of the page size.
    pub embed_batch_size: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Where the finished index is persisted.
    pub index_path: PathBuf,
}

impl BuildOptions {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            page_size: 5000,
            embed_batch_size: 512,
            chunk_size: 2000,
            chunk_overlap: 400,
            index_path: index_path.into(),
        }
    }
}

/// Builds the vector index from the record store in bounded increments.
///
/// Records are paged by `parent_index` ascending, so for a static corpus
/// every record is visited exactly once. The index is created on the first
/// non-empty embedded sub-batch and appended to thereafter; per-page and
/// per-sub-batch intermediates are dropped before the next iteration.
pub struct IncrementalIndexBuilder {
    store: Arc<dyn RecordStore>,
    embedder: Arc<dyn Embedder>,
    progress: Arc<dyn ProgressSink>,
    cancel: Option<Arc<AtomicBool>>,
}

impl IncrementalIndexBuilder {
    pub fn new(
        store: Arc<dyn RecordStore>,
        embedder: Arc<dyn Embedder>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            store,
            embedder,
            progress,
            cancel: None,
        }
    }

    /// Installs a cooperative cancellation flag, polled between pages.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs a full build and persists the finished index to
    /// `options.index_path`. Every failure is converted into a terminal
    /// `Failure` report on `task_id` before it propagates; failures other
    /// than transport errors also remove any partially-written index file
    /// at the target path.
    pub async fn build(&self, task_id: &str, options: &BuildOptions) -> Result<(), EngineError> {
        self.progress
            .report(task_id, TaskStatus::Pending, "starting index build")
            .await?;

        match self.build_pages(task_id, options).await {
            Ok(total) => {
                self.progress
                    .report(
                        task_id,
                        TaskStatus::Success,
                        &format!("index build complete: {total} records embedded"),
                    )
                    .await?;
                Ok(())
            }
            Err(err) => {
                tracing::error!(task_id, error = %err, "index build failed");
                if !matches!(err, EngineError::Transport(_) | EngineError::Cancelled) {
                    remove_partial_index(&options.index_path).await;
                }
                if let Err(report_err) = self
                    .progress
                    .report(task_id, TaskStatus::Failure, &format!("index build failed: {err}"))
                    .await
                {
                    tracing::warn!(task_id, error = %report_err, "failure report not delivered");
                }
                Err(err)
            }
        }
    }

    async fn build_pages(&self, task_id: &str, options: &BuildOptions) -> Result<u64, EngineError> {
        let total = self.store.count().await?;
        if total == 0 {
            return Err(EngineError::EmptyCorpus);
        }
        let page_size = options.page_size.max(1);
        let embed_batch_size = options.embed_batch_size.max(1);

        let mut index: Option<FlatIndex> = None;
        let mut processed: u64 = 0;
        let mut offset: u64 = 0;
        while offset < total {
            self.ensure_not_cancelled()?;

            let records = self.store.page(offset, page_size).await?;
            if records.is_empty() {
                break;
            }
            let page_len = records.len() as u64;

            let chunks = chunk_page(&records, options);
            drop(records);
            tracing::debug!(task_id, offset, chunks = chunks.len(), "page chunked");

            for sub_batch in chunks.chunks(embed_batch_size) {
                let texts: Vec<String> = sub_batch
                    .iter()
                    .map(|chunk| chunk.cleaned_text.clone())
                    .collect();
                let vectors = self.embedder.embed(&texts).await?;
                if vectors.len() != sub_batch.len() {
                    return Err(EngineError::Embedding(format!(
                        "embedder returned {} vectors for {} chunks",
                        vectors.len(),
                        sub_batch.len()
                    )));
                }

                let entries: Vec<IndexEntry> = sub_batch
                    .iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| IndexEntry {
                        content: chunk.raw_text.clone(),
                        vector,
                        payload: ChunkPayload {
                            parent_index: chunk.parent_index,
                            metadata: chunk.metadata.clone(),
                        },
                    })
                    .collect();
                if entries.is_empty() {
                    continue;
                }
                match index.as_mut() {
                    None => index = Some(FlatIndex::from_entries(entries)?),
                    Some(index) => index.append(entries)?,
                }
            }

            processed += page_len;
            offset += page_size;
            self.progress
                .report(
                    task_id,
                    TaskStatus::Pending,
                    &format!("embedding progress: {processed}/{total} records"),
                )
                .await?;
        }

        let Some(index) = index else {
            return Err(EngineError::IndexNotBuilt);
        };

        self.progress
            .report(task_id, TaskStatus::Pending, "saving vector index")
            .await?;
        index.save(&options.index_path).await?;
        tracing::info!(
            task_id,
            entries = index.len(),
            path = %options.index_path.display(),
            "vector index saved"
        );
        Ok(processed)
    }

    fn ensure_not_cancelled(&self) -> Result<(), EngineError> {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(EngineError::Cancelled);
            }
        }
        Ok(())
    }
}

/// Chunks one page of records, dropping chunks that clean down to nothing.
fn chunk_page(records: &[ConsolidatedRecord], options: &BuildOptions) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    for record in records {
        let full_text = format!(
            "{}{QUESTION_ANSWER_JOINT}{}",
            record.question, record.consolidated_answer
        );
        for raw_text in text::split(&full_text, options.chunk_size, options.chunk_overlap) {
            let cleaned_text = text::clean(&raw_text);
            if cleaned_text.is_empty() {
                continue;
            }
            chunks.push(TextChunk {
                parent_index: record.parent_index,
                metadata: record.metadata.clone(),
                raw_text,
                cleaned_text,
            });
        }
    }
    chunks
}

async fn remove_partial_index(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => tracing::warn!(path = %path.display(), "removed partial index artifact"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "partial index cleanup failed");
        }
    }
}
