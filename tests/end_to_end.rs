//! Full flow: ingest a synthetic corpus, build the index, answer a query.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use answersmith::answer::RetrievalAnswerer;
use answersmith::corpus::{MemoryCorpusSource, RawQARow};
use answersmith::embeddings::MockEmbedder;
use answersmith::index::{BuildOptions, IncrementalIndexBuilder};
use answersmith::ingestion::{BatchIngestionPipeline, MemoryProgressSink};
use answersmith::llm::ChatModel;
use answersmith::stores::{RecordStore, SqliteRecordStore};
use answersmith::types::EngineError;

struct ScriptedChat {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedChat {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, _prompt: &str) -> Result<String, EngineError> {
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| EngineError::Completion("script exhausted".into()))
    }
}

fn corpus_row(qid: &str, topic: &str) -> RawQARow {
    RawQARow {
        qid: qid.to_string(),
        question: Some(format!("How do I handle {topic} in my project?")),
        metadata: Some(format!("https://example.com/{qid}")),
        response_variant_a: Some(format!(
            "Use python with pandas to handle {topic}:\n```\nimport pandas as pd\n```"
        )),
        response_variant_b: None,
    }
}

#[tokio::test]
async fn ingest_build_and_answer() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteRecordStore::open(dir.path().join("records.db"))
            .await
            .unwrap(),
    );
    let sink = Arc::new(MemoryProgressSink::new());
    let embedder = Arc::new(MockEmbedder::default());

    // Ingest three relevant question groups.
    let pipeline = BatchIngestionPipeline::new(
        Arc::new(MemoryCorpusSource::new(vec![
            corpus_row("q-csv", "csv files"),
            corpus_row("q-json", "json payloads"),
            corpus_row("q-dates", "date parsing"),
        ])),
        store.clone(),
        sink.clone(),
    );
    assert_eq!(pipeline.run("e2e-ingest", 10).await.unwrap(), 3);

    // Build the index from the persisted records.
    let builder = IncrementalIndexBuilder::new(store.clone(), embedder.clone(), sink.clone());
    let options = BuildOptions::new(dir.path().join("index.json"));
    builder.build("e2e-build", &options).await.unwrap();

    // Query with the exact cleaned text of the json record's chunk so the
    // deterministic mock embedding lands on it with distance zero.
    let target = store.get_by_parent_index(1).await.unwrap().unwrap();
    assert_eq!(target.qid, "q-json");
    let question = answersmith::text::clean(&format!(
        "{}\n\nAnswers:\n{}",
        target.question, target.consolidated_answer
    ));

    let chat = Arc::new(ScriptedChat::new(&["other", "the generated answer"]));
    let answerer =
        RetrievalAnswerer::open(embedder, chat, &options.index_path, store.clone())
            .await
            .unwrap();

    let payload = answerer.answer(&question, 3).await.unwrap();
    assert_eq!(payload.response, "the generated answer");

    // The exact match leads the references with a perfect similarity score.
    let reference = &payload.references[0];
    assert_eq!(reference.similarity, "100.00%");
    assert_eq!(reference.metadata, "https://example.com/q-json");
    assert!(reference.content.contains("json payloads"));
}
