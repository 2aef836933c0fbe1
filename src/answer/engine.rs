//! Query-time retrieval and answer composition.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::prompts::{self, GREETING_CLASSIFIER};
use crate::corpus::ANSWER_SEPARATOR;
use crate::embeddings::Embedder;
use crate::index::{FlatIndex, SearchHit};
use crate::llm::ChatModel;
use crate::stores::RecordStore;
use crate::types::EngineError;

/// Sentinel the greeting classifier returns for non-greetings.
pub const GREETING_SENTINEL: &str = "other";

/// Returned when the vector search yields nothing at all.
pub const NOTHING_FOUND_RESPONSE: &str = "Sorry, I could not find any relevant information.";

/// Returned when even the best hit is too far away to trust.
pub const LOW_CONFIDENCE_RESPONSE: &str =
    "I could not find sufficiently relevant information to answer that.";

/// Results beyond this distance are never cited, regardless of whether an
/// answer was generated. Stricter than the generation cutoff on purpose: it
/// governs which sources are shown, not whether answering is attempted.
pub const REFERENCE_MAX_DISTANCE: f32 = 1.0;

/// One cited source: the full consolidated answer of the record the best
/// matching chunk came from.
#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    pub content: String,
    /// Percentage derived from the distance via `exp(-distance)`.
    pub similarity: String,
    pub metadata: String,
}

/// The composed answer plus its deduplicated source references.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerPayload {
    pub response: String,
    pub references: Vec<Reference>,
}

impl AnswerPayload {
    fn without_references(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            references: Vec::new(),
        }
    }
}

/// How a question was resolved, before references are attached. Expected
/// outcomes are values here, never errors.
enum AnswerOutcome {
    Greeting(String),
    Answer {
        response: String,
        hits: Vec<SearchHit>,
    },
    NotFound,
    LowConfidence,
}

/// Stateless per-call pipeline over the vector index and record store.
///
/// All collaborators are injected once at construction and reused for every
/// call. External-call failures propagate as typed errors; retry policy
/// belongs to the caller.
pub struct RetrievalAnswerer {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    index: FlatIndex,
    store: Arc<dyn RecordStore>,
}

impl RetrievalAnswerer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        index: FlatIndex,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            embedder,
            chat,
            index,
            store,
        }
    }

    /// Loads the index from `index_path` and wires the answerer up.
    pub async fn open(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        index_path: impl AsRef<Path>,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, EngineError> {
        let index = FlatIndex::load(index_path).await?;
        Ok(Self::new(embedder, chat, index, store))
    }

    /// Answers a question with up to `top_k` retrieved chunks as context.
    pub async fn answer(&self, question: &str, top_k: usize) -> Result<AnswerPayload, EngineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::Validation("question must not be empty".into()));
        }

        match self.decide(question, top_k).await? {
            AnswerOutcome::Greeting(reply) => Ok(AnswerPayload::without_references(reply)),
            AnswerOutcome::NotFound => {
                Ok(AnswerPayload::without_references(NOTHING_FOUND_RESPONSE))
            }
            AnswerOutcome::LowConfidence => {
                Ok(AnswerPayload::without_references(LOW_CONFIDENCE_RESPONSE))
            }
            AnswerOutcome::Answer { response, hits } => {
                let references = self.collect_references(&hits).await?;
                Ok(AnswerPayload {
                    response,
                    references,
                })
            }
        }
    }

    async fn decide(&self, question: &str, top_k: usize) -> Result<AnswerOutcome, EngineError> {
        if let Some(reply) = self.classify_greeting(question).await? {
            return Ok(AnswerOutcome::Greeting(reply));
        }

        let query_vectors = self.embedder.embed(&[question.to_string()]).await?;
        let query = query_vectors
            .first()
            .ok_or_else(|| EngineError::Embedding("embedder returned no query vector".into()))?;

        let hits = self.index.search(query, top_k)?;
        if hits.is_empty() {
            return Ok(AnswerOutcome::NotFound);
        }

        let best_distance = hits[0].distance;
        let Some(template) = prompts::select_prompt(best_distance) else {
            tracing::debug!(best_distance, "best hit below confidence floor");
            return Ok(AnswerOutcome::LowConfidence);
        };

        let context = hits
            .iter()
            .map(|hit| hit.content.as_str())
            .collect::<Vec<_>>()
            .join(ANSWER_SEPARATOR);
        let prompt = template.render(&[("context", &context), ("question", question)]);
        let response = self.chat.complete(&prompt).await?;
        Ok(AnswerOutcome::Answer { response, hits })
    }

    /// Asks the classifier prompt whether the question is a greeting;
    /// returns the reply to short-circuit with, or `None` to proceed.
    async fn classify_greeting(&self, question: &str) -> Result<Option<String>, EngineError> {
        let prompt = GREETING_CLASSIFIER.render(&[("question", question)]);
        let raw = self.chat.complete(&prompt).await?;
        let verdict = raw.trim();
        if verdict.eq_ignore_ascii_case(GREETING_SENTINEL) {
            Ok(None)
        } else {
            Ok(Some(verdict.to_string()))
        }
    }

    /// Prunes, deduplicates, and resolves search hits into references.
    ///
    /// The single best hit is always kept; the rest must sit within
    /// [`REFERENCE_MAX_DISTANCE`]. Hits sharing a `parent_index` collapse to
    /// the lowest-distance occurrence, then each surviving index is looked
    /// up in the record store for the full answer text.
    async fn collect_references(&self, hits: &[SearchHit]) -> Result<Vec<Reference>, EngineError> {
        let mut discovery_order: Vec<i64> = Vec::new();
        let mut best_distance: HashMap<i64, f32> = HashMap::new();
        for (position, hit) in hits.iter().enumerate() {
            if position > 0 && hit.distance > REFERENCE_MAX_DISTANCE {
                continue;
            }
            let parent_index = hit.payload.parent_index;
            match best_distance.get_mut(&parent_index) {
                None => {
                    discovery_order.push(parent_index);
                    best_distance.insert(parent_index, hit.distance);
                }
                Some(existing) => {
                    if hit.distance < *existing {
                        *existing = hit.distance;
                    }
                }
            }
        }

        let mut references = Vec::with_capacity(discovery_order.len());
        for parent_index in discovery_order {
            let Some(record) = self.store.get_by_parent_index(parent_index).await? else {
                tracing::warn!(parent_index, "indexed chunk points at a missing record");
                continue;
            };
            references.push(Reference {
                content: record.consolidated_answer,
                similarity: format_similarity(best_distance[&parent_index]),
                metadata: record.metadata,
            });
        }
        Ok(references)
    }
}

/// Converts a squared-L2 distance into a similarity percentage via
/// `exp(-distance)`.
pub fn format_similarity(distance: f32) -> String {
    let similarity = (-f64::from(distance)).exp() * 100.0;
    format!("{similarity:.2}%")
}
