//! Full pipeline walkthrough on a synthetic corpus: ingest, build the index,
//! then answer a few queries. Network-backed collaborators are swapped for
//! the in-memory source, the deterministic mock embedder, and a canned chat
//! model, so the demo runs offline.
//!
//! ```bash
//! cargo run --example qa_pipeline
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing_subscriber::FmtSubscriber;

use answersmith::answer::RetrievalAnswerer;
use answersmith::corpus::{MemoryCorpusSource, RawQARow};
use answersmith::embeddings::MockEmbedder;
use answersmith::index::{BuildOptions, IncrementalIndexBuilder};
use answersmith::ingestion::{new_task_id, BatchIngestionPipeline, TracingProgressSink};
use answersmith::llm::ChatModel;
use answersmith::stores::{RecordStore, SqliteRecordStore};
use answersmith::types::EngineError;

/// Stand-in for the generative service: classifies greetings by inspecting
/// the classifier prompt and returns a canned completion for everything else.
struct CannedChat;

#[async_trait]
impl ChatModel for CannedChat {
    async fn complete(&self, prompt: &str) -> Result<String, EngineError> {
        if let Some(phrase) = prompt.split("Phrase:").nth(1) {
            let reply = if phrase.to_lowercase().contains("hello") {
                "Hello! Ask me anything about Python."
            } else {
                "other"
            };
            return Ok(reply.to_string());
        }
        Ok("Canned completion generated from the retrieved context.".to_string())
    }
}

fn relevant_row(qid: &str, topic: &str) -> RawQARow {
    RawQARow {
        qid: qid.to_string(),
        question: Some(format!("How do I handle {topic}?")),
        metadata: Some(format!("https://example.com/questions/{qid}")),
        response_variant_a: Some(format!(
            "Use python with pandas for {topic}:\n```\nimport pandas as pd\n```"
        )),
        response_variant_b: None,
    }
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    init_tracing();

    let work_dir = env::var("ANSWERSMITH_DEMO_DIR").unwrap_or_else(|_| "./answersmith_demo".to_string());
    let work_dir = PathBuf::from(work_dir);
    fs::create_dir_all(&work_dir).await?;
    let db_path = work_dir.join("records.db");
    let index_path = work_dir.join("index.json");

    // A corpus of five question groups; two fail the relevance filter.
    let rows = vec![
        relevant_row("q-csv", "reading csv files"),
        relevant_row("q-merge", "merging dataframes"),
        relevant_row("q-dates", "parsing dates"),
        RawQARow {
            qid: "q-prose".to_string(),
            question: Some("What is your favourite colour?".to_string()),
            metadata: None,
            response_variant_a: Some("Plain prose, no code at all.".to_string()),
            response_variant_b: None,
        },
        RawQARow {
            qid: "q-java".to_string(),
            question: Some("How do I read a file in java?".to_string()),
            metadata: None,
            response_variant_a: Some("python pandas numpy\n```\ncode\n```".to_string()),
            response_variant_b: None,
        },
    ];

    let store = Arc::new(SqliteRecordStore::open(&db_path).await?);
    let progress = Arc::new(TracingProgressSink);
    let embedder = Arc::new(MockEmbedder::default());

    println!("→ Ingesting {} raw rows", rows.len());
    let pipeline = BatchIngestionPipeline::new(
        Arc::new(MemoryCorpusSource::new(rows)),
        store.clone(),
        progress.clone(),
    );
    let persisted = pipeline.run(&new_task_id(), 2).await?;
    println!("   persisted {persisted} relevant records");

    println!("→ Building the vector index");
    let builder = IncrementalIndexBuilder::new(store.clone(), embedder.clone(), progress);
    builder
        .build(&new_task_id(), &BuildOptions::new(&index_path))
        .await?;

    let chat = Arc::new(CannedChat);
    let answerer = RetrievalAnswerer::open(embedder, chat, &index_path, store.clone()).await?;

    // A greeting short-circuits before any retrieval.
    let greeting = answerer.answer("Hello!", 3).await?;
    println!("\n→ \"Hello!\"");
    println!("   {}", greeting.response);

    // Querying with a stored record's own chunk text lands on it exactly
    // (the mock embedder is a pure function of the text).
    let record = store
        .get_by_parent_index(0)
        .await?
        .expect("record 0 was just ingested");
    let on_topic = answersmith::text::clean(&format!(
        "{}\n\nAnswers:\n{}",
        record.question, record.consolidated_answer
    ));
    let payload = answerer.answer(&on_topic, 3).await?;
    println!("\n→ on-topic query ({})", record.qid);
    println!("   {}", payload.response);
    for reference in &payload.references {
        println!("   source {} ({})", reference.metadata, reference.similarity);
    }

    // An off-topic query embeds far from every chunk.
    let off_topic = answerer.answer("How do I deploy a kubernetes cluster?", 3).await?;
    println!("\n→ off-topic query");
    println!("   {}", off_topic.response);

    println!("\n✅ Demo complete");
    println!("  sqlite database : {}", db_path.display());
    println!("  vector index    : {}", index_path.display());
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
