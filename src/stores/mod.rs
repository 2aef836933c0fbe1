//! Persistence for consolidated records.
//!
//! The [`RecordStore`] trait abstracts the keyed record store the pipelines
//! write into and the answerer reads from. Pagination is ordered by
//! `parent_index` ascending and must be stable and total: every record is
//! visited exactly once for a static corpus snapshot.

pub mod sqlite;

use async_trait::async_trait;

use crate::corpus::ConsolidatedRecord;
use crate::types::EngineError;

pub use sqlite::SqliteRecordStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Removes every record. Ingestion wipes before writing so
    /// `parent_index` assignment always restarts from zero.
    async fn delete_all(&self) -> Result<(), EngineError>;

    /// Inserts a batch of records atomically. A duplicate `parent_index`
    /// fails the whole batch with [`EngineError::Storage`].
    async fn bulk_insert(&self, records: &[ConsolidatedRecord]) -> Result<(), EngineError>;

    /// One page of records ordered by `parent_index` ascending.
    async fn page(&self, offset: u64, limit: u64) -> Result<Vec<ConsolidatedRecord>, EngineError>;

    async fn get_by_parent_index(
        &self,
        parent_index: i64,
    ) -> Result<Option<ConsolidatedRecord>, EngineError>;

    async fn count(&self) -> Result<u64, EngineError>;
}
