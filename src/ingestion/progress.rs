//! Status reporting for long-running pipeline jobs.
//!
//! The pipelines own their task's progress for the duration of a run and
//! write through a [`ProgressSink`]; external status-polling callers read
//! from whatever the sink feeds. The sink is append-only from the pipeline's
//! point of view.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::EngineError;

/// Lifecycle of a pipeline run. `Pending` repeats with fresh messages while
/// the run advances; `Success` and `Failure` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Success,
    Failure,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::Success => write!(f, "SUCCESS"),
            TaskStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// One reported progress update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fresh task identifier for a pipeline run.
pub fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(
        &self,
        task_id: &str,
        status: TaskStatus,
        message: &str,
    ) -> Result<(), EngineError>;
}

/// Keeps the full report history in memory. Useful in tests and for
/// in-process status polling.
#[derive(Debug, Default)]
pub struct MemoryProgressSink {
    history: Mutex<Vec<TaskProgress>>,
}

impl MemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every report made so far, oldest first.
    pub fn history(&self) -> Vec<TaskProgress> {
        self.history.lock().clone()
    }

    /// The most recent report for `task_id`, if any.
    pub fn latest(&self, task_id: &str) -> Option<TaskProgress> {
        self.history
            .lock()
            .iter()
            .rev()
            .find(|progress| progress.task_id == task_id)
            .cloned()
    }
}

#[async_trait]
impl ProgressSink for MemoryProgressSink {
    async fn report(
        &self,
        task_id: &str,
        status: TaskStatus,
        message: &str,
    ) -> Result<(), EngineError> {
        let mut history = self.history.lock();
        let created_at = history
            .iter()
            .find(|progress| progress.task_id == task_id)
            .map(|progress| progress.created_at)
            .unwrap_or_else(Utc::now);
        history.push(TaskProgress {
            task_id: task_id.to_string(),
            status,
            message: message.to_string(),
            created_at,
            updated_at: Utc::now(),
        });
        Ok(())
    }
}

/// Forwards every report to the tracing subscriber. The default sink when
/// no external status store is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

#[async_trait]
impl ProgressSink for TracingProgressSink {
    async fn report(
        &self,
        task_id: &str,
        status: TaskStatus,
        message: &str,
    ) -> Result<(), EngineError> {
        tracing::info!(task_id, status = %status, message, "task progress");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_sink_keeps_history_and_latest() {
        let sink = MemoryProgressSink::new();
        sink.report("t1", TaskStatus::Pending, "starting").await.unwrap();
        sink.report("t2", TaskStatus::Pending, "other task").await.unwrap();
        sink.report("t1", TaskStatus::Success, "done").await.unwrap();

        assert_eq!(sink.history().len(), 3);
        let latest = sink.latest("t1").unwrap();
        assert_eq!(latest.status, TaskStatus::Success);
        assert_eq!(latest.message, "done");
        assert!(latest.created_at <= latest.updated_at);
        assert!(sink.latest("missing").is_none());
    }

    #[test]
    fn task_ids_are_unique() {
        assert_ne!(new_task_id(), new_task_id());
    }
}
