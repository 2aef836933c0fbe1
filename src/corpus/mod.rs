//! Corpus data model and the fetch → group → filter stages of ingestion.

pub mod consolidate;
pub mod relevance;
pub mod source;

use serde::{Deserialize, Serialize};

pub use consolidate::{consolidate, group_rows, GroupedQa};
pub use relevance::{classify, RelevanceFlags};
pub use source::{CorpusSource, HttpCorpusSource, MemoryCorpusSource};

/// Separator used when joining deduplicated answer variants, and again when
/// concatenating retrieved chunks into completion context.
pub const ANSWER_SEPARATOR: &str = "\n\n---\n\n";

/// One raw row per (question, answer-variant) pair, as delivered by the
/// source pages. Several rows share a `qid`; consolidation folds them into a
/// single record. Rows only live for the duration of one ingestion batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQARow {
    /// Grouping key shared by every row belonging to the same question.
    pub qid: String,
    #[serde(default)]
    pub question: Option<String>,
    /// Source tag or link carried through to the final references.
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub response_variant_a: Option<String>,
    #[serde(default)]
    pub response_variant_b: Option<String>,
}

/// One persisted record per retained question group.
///
/// `parent_index` is a dense 0-based surrogate assigned at persistence time,
/// after relevance filtering, in first-seen `qid` order. It maps embedded
/// chunks back to their source record and is unrelated to the `qid` itself.
/// Records are read-only once persisted; re-ingestion wipes the store and
/// reassigns indices from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    pub parent_index: i64,
    pub qid: String,
    pub question: String,
    pub metadata: String,
    pub consolidated_answer: String,
}
