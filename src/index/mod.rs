//! Vector index over embedded chunks, plus the incremental builder that
//! fills it from the record store.

pub mod builder;
pub mod flat;

use serde::{Deserialize, Serialize};

pub use builder::{BuildOptions, IncrementalIndexBuilder, TextChunk};
pub use flat::FlatIndex;

/// Payload carried alongside every stored vector, linking a chunk back to
/// its source record. Many entries may share one `parent_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub parent_index: i64,
    pub metadata: String,
}

/// A chunk ready for insertion: the raw text kept as retrievable content,
/// its embedding vector, and the back-reference payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub content: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// One nearest-neighbor result. Distance is squared Euclidean (L2); lower
/// means more similar.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub content: String,
    pub payload: ChunkPayload,
    pub distance: f32,
}
