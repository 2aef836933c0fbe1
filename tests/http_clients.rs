//! HTTP collaborators against a mock server: corpus source, embeddings,
//! and chat completions.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use answersmith::corpus::{CorpusSource, HttpCorpusSource};
use answersmith::embeddings::{Embedder, HttpEmbedder};
use answersmith::llm::{ChatModel, HttpChatModel};
use answersmith::types::EngineError;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn corpus_source_resolves_manifest_pages_and_caches() {
    let server = MockServer::start_async().await;

    let page_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/pages/1");
            then.status(200).json_body(json!([
                {
                    "qid": "q1",
                    "question": "How?",
                    "metadata": "https://example.com/q1",
                    "response_variant_a": "answer one",
                    "response_variant_b": null
                },
                {
                    "qid": "q2",
                    "question": "Why?",
                    "response_variant_a": "answer two"
                }
            ]));
        })
        .await;
    let manifest_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/manifest");
            then.status(200)
                .json_body(json!([server.url("/pages/1")]));
        })
        .await;

    let source = HttpCorpusSource::new(
        vec![Url::parse(&server.url("/manifest")).unwrap()],
        TIMEOUT,
    )
    .unwrap();

    let batches = source.qid_batches(10).await.unwrap();
    assert_eq!(batches, vec![vec!["q1".to_string(), "q2".to_string()]]);

    let rows = source.rows_for_qids(&["q2".to_string()]).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].question.as_deref(), Some("Why?"));
    assert_eq!(rows[0].metadata, None);

    // Both calls above were served from the cache: one manifest fetch, one
    // page fetch. Clearing the cache forces a refetch.
    assert_eq!(manifest_mock.hits_async().await, 1);
    assert_eq!(page_mock.hits_async().await, 1);

    source.clear_cache().await;
    source.qid_batches(10).await.unwrap();
    assert_eq!(manifest_mock.hits_async().await, 2);
    assert_eq!(page_mock.hits_async().await, 2);
}

#[tokio::test]
async fn corpus_source_propagates_transport_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/manifest");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let source = HttpCorpusSource::new(
        vec![Url::parse(&server.url("/manifest")).unwrap()],
        TIMEOUT,
    )
    .unwrap();

    let err = source.qid_batches(10).await.unwrap_err();
    assert!(matches!(err, EngineError::Transport(_)));
}

#[tokio::test]
async fn embedder_reorders_responses_by_index() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({
                "data": [
                    { "index": 1, "embedding": [1.0, 1.0] },
                    { "index": 0, "embedding": [0.0, 0.0] }
                ]
            }));
        })
        .await;

    let embedder = HttpEmbedder::new(&server.url("/v1"), "test-model", None, TIMEOUT).unwrap();
    let vectors = embedder
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();
    assert_eq!(vectors, vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
}

#[tokio::test]
async fn embedder_rejects_count_mismatch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({
                "data": [{ "index": 0, "embedding": [0.5] }]
            }));
        })
        .await;

    let embedder = HttpEmbedder::new(&server.url("/v1"), "test-model", None, TIMEOUT).unwrap();
    let err = embedder
        .embed(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Embedding(_)));
}

#[tokio::test]
async fn embedder_surfaces_service_errors_with_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(429).body("rate limited");
        })
        .await;

    let embedder = HttpEmbedder::new(&server.url("/v1"), "test-model", None, TIMEOUT).unwrap();
    let err = embedder.embed(&["a".to_string()]).await.unwrap_err();
    match err {
        EngineError::Embedding(message) => {
            assert!(message.contains("429"));
            assert!(message.contains("rate limited"));
        }
        other => panic!("expected embedding error, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_model_sends_bearer_auth_and_reads_first_choice() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer secret-key")
                .json_body_partial(r#"{ "model": "test-chat" }"#);
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "content": "completion text" } }
                ]
            }));
        })
        .await;

    let chat = HttpChatModel::new(
        &server.url("/v1"),
        "test-chat",
        Some("secret-key"),
        0.3,
        TIMEOUT,
    )
    .unwrap();
    let text = chat.complete("a prompt").await.unwrap();
    assert_eq!(text, "completion text");
    mock.assert_async().await;
}

#[tokio::test]
async fn chat_model_rejects_empty_choices() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        })
        .await;

    let chat = HttpChatModel::new(&server.url("/v1"), "test-chat", None, 0.3, TIMEOUT).unwrap();
    let err = chat.complete("a prompt").await.unwrap_err();
    assert!(matches!(err, EngineError::Completion(_)));
}
