//! Fetch → consolidate → filter → persist, in bounded batches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::corpus::consolidate::consolidate;
use crate::corpus::source::CorpusSource;
use crate::ingestion::progress::{ProgressSink, TaskStatus};
use crate::stores::RecordStore;
use crate::types::EngineError;

/// Runs the corpus through consolidation and relevance filtering in batches
/// of question groups, persisting each batch before the next is fetched.
///
/// Batching bounds peak memory: a batch holds at most `qids_per_batch`
/// question groups worth of raw rows, and all per-batch intermediates are
/// dropped before the next fetch. Each batch's retained records are
/// persisted immediately, so partial progress survives a later failure;
/// the caller decides whether to wipe and retry.
///
/// One run per record store at a time; concurrent runs against the same
/// store are unsafe and must be prevented by the caller.
pub struct BatchIngestionPipeline {
    source: Arc<dyn CorpusSource>,
    store: Arc<dyn RecordStore>,
    progress: Arc<dyn ProgressSink>,
    cancel: Option<Arc<AtomicBool>>,
}

impl BatchIngestionPipeline {
    pub fn new(
        source: Arc<dyn CorpusSource>,
        store: Arc<dyn RecordStore>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            source,
            store,
            progress,
            cancel: None,
        }
    }

    /// Installs a cooperative cancellation flag, polled between batches.
    /// Cancellation never corrupts already-persisted batches.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs a full ingestion and returns the cumulative count of persisted
    /// records. Every failure is converted into a terminal `Failure` report
    /// on `task_id` before it propagates.
    pub async fn run(&self, task_id: &str, qids_per_batch: usize) -> Result<u64, EngineError> {
        self.progress
            .report(task_id, TaskStatus::Pending, "starting corpus ingestion")
            .await?;

        let outcome = self.run_batches(task_id, qids_per_batch).await;
        self.source.clear_cache().await;

        match outcome {
            Ok(total) => {
                self.progress
                    .report(
                        task_id,
                        TaskStatus::Success,
                        &format!("ingestion complete: {total} records persisted"),
                    )
                    .await?;
                Ok(total)
            }
            Err(err) => {
                tracing::error!(task_id, error = %err, "ingestion failed");
                if let Err(report_err) = self
                    .progress
                    .report(task_id, TaskStatus::Failure, &format!("ingestion failed: {err}"))
                    .await
                {
                    tracing::warn!(task_id, error = %report_err, "failure report not delivered");
                }
                Err(err)
            }
        }
    }

    async fn run_batches(&self, task_id: &str, qids_per_batch: usize) -> Result<u64, EngineError> {
        // Full wipe: parent_index assignment restarts from zero every run.
        self.store.delete_all().await?;

        let batches = self.source.qid_batches(qids_per_batch).await?;
        let batch_count = batches.len();
        tracing::info!(task_id, batches = batch_count, qids_per_batch, "ingestion plan ready");

        let mut total: u64 = 0;
        let mut next_parent_index: i64 = 0;
        for (number, qids) in batches.into_iter().enumerate() {
            let batch_label = number + 1;
            self.ensure_not_cancelled()?;

            self.progress
                .report(
                    task_id,
                    TaskStatus::Pending,
                    &format!(
                        "batch {batch_label}/{batch_count}: fetching {} question groups",
                        qids.len()
                    ),
                )
                .await?;
            let rows = self.source.rows_for_qids(&qids).await?;

            let mut records = consolidate(rows);
            self.progress
                .report(
                    task_id,
                    TaskStatus::Pending,
                    &format!(
                        "batch {batch_label}/{batch_count}: consolidated into {} relevant records",
                        records.len()
                    ),
                )
                .await?;

            // Offset this batch's dense indices by the running total so
            // parent_index stays dense across the whole run.
            for record in &mut records {
                record.parent_index += next_parent_index;
            }
            next_parent_index += records.len() as i64;

            if !records.is_empty() {
                self.store.bulk_insert(&records).await?;
            }
            total += records.len() as u64;

            self.progress
                .report(
                    task_id,
                    TaskStatus::Pending,
                    &format!("batch {batch_label}/{batch_count}: persisted (running total {total})"),
                )
                .await?;
        }

        Ok(total)
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
