//! SQLite-backed record store.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, OptionalExtension};

use super::RecordStore;
use crate::corpus::ConsolidatedRecord;
use crate::types::EngineError;

/// Record store on a single SQLite table keyed by `parent_index`.
///
/// `Connection` is a handle onto a dedicated background thread, so clones are
/// cheap and the store is safe to share across tasks.
#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Opens (or creates) the database at `path` and ensures the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))?;
        let store = Self { conn };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), EngineError> {
        self.conn
            .call(|conn| -> tokio_rusqlite::rusqlite::Result<()> {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS records (
                        parent_index INTEGER PRIMARY KEY,
                        qid TEXT NOT NULL,
                        question TEXT NOT NULL,
                        metadata TEXT NOT NULL,
                        consolidated_answer TEXT NOT NULL
                    )",
                )?;
                Ok(())
            })
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn delete_all(&self) -> Result<(), EngineError> {
        self.conn
            .call(|conn| -> tokio_rusqlite::rusqlite::Result<()> {
                conn.execute("DELETE FROM records", [])?;
                Ok(())
            })
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))
    }

    async fn bulk_insert(&self, records: &[ConsolidatedRecord]) -> Result<(), EngineError> {
        if records.is_empty() {
            return Ok(());
        }
        let records = records.to_vec();
        self.conn
            .call(move |conn| -> tokio_rusqlite::rusqlite::Result<()> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO records
                         (parent_index, qid, question, metadata, consolidated_answer)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )?;
                    for record in &records {
                        stmt.execute((
                            record.parent_index,
                            record.qid.as_str(),
                            record.question.as_str(),
                            record.metadata.as_str(),
                            record.consolidated_answer.as_str(),
                        ))?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))
    }

    async fn page(&self, offset: u64, limit: u64) -> Result<Vec<ConsolidatedRecord>, EngineError> {
        self.conn
            .call(move |conn| -> tokio_rusqlite::rusqlite::Result<Vec<ConsolidatedRecord>> {
                let mut stmt = conn.prepare(
                    "SELECT parent_index, qid, question, metadata, consolidated_answer
                     FROM records ORDER BY parent_index ASC LIMIT ?1 OFFSET ?2",
                )?;
                let rows = stmt.query_map((limit as i64, offset as i64), |row| {
                    Ok(ConsolidatedRecord {
                        parent_index: row.get(0)?,
                        qid: row.get(1)?,
                        question: row.get(2)?,
                        metadata: row.get(3)?,
                        consolidated_answer: row.get(4)?,
                    })
                })?;
                let mut records = Vec::new();
                for row in rows {
                    records.push(row?);
                }
                Ok(records)
            })
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))
    }

    async fn get_by_parent_index(
        &self,
        parent_index: i64,
    ) -> Result<Option<ConsolidatedRecord>, EngineError> {
        self.conn
            .call(move |conn| -> tokio_rusqlite::rusqlite::Result<Option<ConsolidatedRecord>> {
                let mut stmt = conn.prepare(
                    "SELECT parent_index, qid, question, metadata, consolidated_answer
                     FROM records WHERE parent_index = ?1",
                )?;
                let record = stmt
                    .query_row([parent_index], |row| {
                        Ok(ConsolidatedRecord {
                            parent_index: row.get(0)?,
                            qid: row.get(1)?,
                            question: row.get(2)?,
                            metadata: row.get(3)?,
                            consolidated_answer: row.get(4)?,
                        })
                    })
                    .optional()?;
                Ok(record)
            })
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))
    }

    async fn count(&self) -> Result<u64, EngineError> {
        self.conn
            .call(|conn| -> tokio_rusqlite::rusqlite::Result<u64> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(parent_index: i64) -> ConsolidatedRecord {
        ConsolidatedRecord {
            parent_index,
            qid: format!("qid-{parent_index}"),
            question: format!("question {parent_index}?"),
            metadata: format!("https://example.com/{parent_index}"),
            consolidated_answer: format!("answer {parent_index}"),
        }
    }

    async fn open_temp() -> (tempfile::TempDir, SqliteRecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::open(dir.path().join("records.db"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn insert_page_and_lookup_round_trip() {
        let (_dir, store) = open_temp().await;
        let records: Vec<_> = (0..7).map(record).collect();
        store.bulk_insert(&records).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 7);

        let page = store.page(2, 3).await.unwrap();
        assert_eq!(
            page.iter().map(|r| r.parent_index).collect::<Vec<_>>(),
            vec![2, 3, 4],
        );

        let found = store.get_by_parent_index(5).await.unwrap();
        assert_eq!(found, Some(record(5)));
        assert_eq!(store.get_by_parent_index(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_parent_index_fails_whole_batch() {
        let (_dir, store) = open_temp().await;
        store.bulk_insert(&[record(0)]).await.unwrap();

        let err = store
            .bulk_insert(&[record(1), record(0)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
        // The transaction rolled back: record 1 was not kept either.
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_all_resets_the_table() {
        let (_dir, store) = open_temp().await;
        store
            .bulk_insert(&(0..4).map(record).collect::<Vec<_>>())
            .await
            .unwrap();
        store.delete_all().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.page(0, 10).await.unwrap().is_empty());
    }
}
