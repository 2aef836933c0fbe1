//! ```text
//! Raw Q&A pages ──► ingestion::BatchIngestionPipeline ──► stores::SqliteRecordStore
//!   (corpus::source)         │
//!                            ├─► corpus::consolidate (group + dedupe per qid)
//!                            └─► corpus::relevance   (keyword/structure filter)
//!
//! Stored records ──► index::IncrementalIndexBuilder ──► index::FlatIndex (on disk)
//!                            │
//!                            ├─► text::chunk + text::clean
//!                            └─► embeddings (sub-batched)
//!
//! FlatIndex + records ──► answer::RetrievalAnswerer ──► AnswerPayload
//!                            │
//!                            └─► llm (greeting gate + tiered completion)
//! ```

pub mod answer;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod ingestion;
pub mod llm;
pub mod stores;
pub mod text;
pub mod types;

pub use answer::{AnswerPayload, Reference, RetrievalAnswerer};
pub use config::EngineConfig;
pub use corpus::{ConsolidatedRecord, RawQARow};
pub use index::{FlatIndex, IncrementalIndexBuilder};
pub use ingestion::{BatchIngestionPipeline, ProgressSink, TaskStatus};
pub use stores::{RecordStore, SqliteRecordStore};
pub use types::EngineError;
