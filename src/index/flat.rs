//! Exact flat vector index with squared-L2 scan and JSON persistence.

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use super::{IndexEntry, SearchHit};
use crate::types::EngineError;

/// Brute-force vector index: every query scans all stored vectors.
///
/// Exactness keeps the `parent_index`-to-vector mapping reproducible, and
/// the whole index round-trips through [`FlatIndex::save`] /
/// [`FlatIndex::load`] as an opaque JSON blob: a reloaded index answers
/// `search` identically to the pre-save index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    /// Creates an index from the first non-empty batch of entries. The first
    /// entry fixes the vector dimensionality.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Result<Self, EngineError> {
        let Some(first) = entries.first() else {
            return Err(EngineError::Index(
                "cannot create an index from zero entries".into(),
            ));
        };
        let mut index = Self {
            dimensions: first.vector.len(),
            entries: Vec::new(),
        };
        index.append(entries)?;
        Ok(index)
    }

    /// Appends a batch of entries, rejecting vectors of the wrong width.
    pub fn append(&mut self, entries: Vec<IndexEntry>) -> Result<(), EngineError> {
        for entry in &entries {
            if entry.vector.len() != self.dimensions {
                return Err(EngineError::Index(format!(
                    "entry vector has {} dimensions, index expects {}",
                    entry.vector.len(),
                    self.dimensions
                )));
            }
        }
        self.entries.extend(entries);
        Ok(())
    }

    /// Top `k` entries by ascending squared-L2 distance from `query`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, EngineError> {
        if query.len() != self.dimensions {
            return Err(EngineError::Index(format!(
                "query vector has {} dimensions, index expects {}",
                query.len(),
                self.dimensions
            )));
        }
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (squared_l2(query, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, entry)| SearchHit {
                content: entry.content.clone(),
                payload: entry.payload.clone(),
                distance,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persists the index to `path`, creating parent directories as needed.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let serialized = serde_json::to_string(self)?;
        fs::write(path, serialized).await?;
        Ok(())
    }

    /// Loads a previously saved index from `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let data = fs::read_to_string(path.as_ref()).await?;
        Ok(serde_json::from_str(&data)?)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
