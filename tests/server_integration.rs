//! End-to-end tests of the HTTP API.
//!
//! Each test writes real artifacts to a temp dir, points the `ollama`
//! embedding provider at an in-process fake, and drives the server over
//! HTTP.

mod common;

use agribot::assembler::LOW_CONFIDENCE_ANSWER;
use agribot::config;
use agribot::errors::{MODEL_NOT_LOADED_MESSAGE, QUERY_FAILED_MESSAGE};
use agribot::server::run_server;
use common::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct TestServer {
    _tmp: TempDir,
    base: String,
    embed_calls: Arc<AtomicUsize>,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server(with_artifacts: bool) -> TestServer {
    let tmp = TempDir::new().unwrap();
    if with_artifacts {
        write_artifacts(tmp.path());
    }
    let (ollama, embed_calls) = spawn_counting_ollama().await;
    let port = find_free_port();
    let config_path = write_config(&tmp, port, Some(&ollama));
    let cfg = config::load_config(&config_path).unwrap();

    let handle = tokio::spawn(async move {
        run_server(&cfg).await.ok();
    });
    wait_for_server(port).await;

    TestServer {
        _tmp: tmp,
        base: format!("http://127.0.0.1:{}", port),
        embed_calls,
        handle,
    }
}

async fn ask(server: &TestServer, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/ask", server.base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn get_json(server: &TestServer, path: &str) -> (u16, Value) {
    let resp = reqwest::get(format!("{}{}", server.base, path)).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_greeting_returns_canned_reply() {
    let server = start_server(true).await;

    let (status, body) = ask(&server, json!({ "question": "hi" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["question"], "hi");
    assert_eq!(
        body["answer"],
        "Hello! How can I assist you with agriculture today?"
    );
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn test_question_answered_from_chunks() {
    let server = start_server(true).await;

    let (status, body) = ask(&server, json!({ "question": "  What is organic farming?  " })).await;
    assert_eq!(status, 200);
    assert_eq!(body["question"], "What is organic farming?");
    assert_eq!(
        body["answer"],
        "Organic farming avoids synthetic inputs. It relies on compost and crop rotation."
    );
}

#[tokio::test]
async fn test_unrelated_question_gets_low_confidence_reply() {
    let server = start_server(true).await;

    let (status, body) = ask(&server, json!({ "question": "asdkjasdkj random nonsense" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["answer"], LOW_CONFIDENCE_ANSWER);
}

#[tokio::test]
async fn test_missing_question_is_400() {
    let server = start_server(true).await;

    let (status, body) = ask(&server, json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "Question is required" }));

    let (status, _) = ask(&server, json!({ "question": "   " })).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_embedding_failure_is_generic_500() {
    let server = start_server(true).await;

    let (status, body) = ask(&server, json!({ "question": "explode please" })).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "error": QUERY_FAILED_MESSAGE }));

    // The server keeps serving after a failed query.
    let (status, _) = ask(&server, json!({ "question": "organic?" })).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_embedding_failure_is_not_retried() {
    let server = start_server(true).await;

    let started = std::time::Instant::now();
    let (status, body) = ask(&server, json!({ "question": "explode organic" })).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "error": QUERY_FAILED_MESSAGE }));
    assert_eq!(server.embed_calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < std::time::Duration::from_secs(1));

    let resp = reqwest::Client::new()
        .post(format!("{}/search", server.base))
        .json(&json!({ "query": "explode" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(server.embed_calls.load(Ordering::SeqCst), 2);
}

async fn post_raw(server: &TestServer, path: &str, body: &'static str) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}{}", server.base, path))
        .body(body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_empty_body_is_json_400() {
    let server = start_server(true).await;

    let (status, body) = post_raw(&server, "/ask", "").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "Question is required" }));

    let (status, body) = post_raw(&server, "/search", "").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "Query is required" }));
}

#[tokio::test]
async fn test_malformed_body_is_json_400() {
    let server = start_server(true).await;

    let (status, body) = ask(&server, json!({ "question": 123 })).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "Invalid JSON body" }));

    let (status, body) = post_raw(&server, "/ask", "{not json").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "Invalid JSON body" }));

    let resp = reqwest::Client::new()
        .post(format!("{}/search", server.base))
        .json(&json!({ "query": "organic", "top_k": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid JSON body" }));

    let (status, body) = get_json(&server, "/history?limit=abc").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "limit must be an integer" }));

    assert_eq!(server.embed_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_ranks_results() {
    let server = start_server(true).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/search", server.base))
        .json(&json!({ "query": "organic" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["query"], "organic");
    assert_eq!(body["total_results"], 2);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["rank"], 1);
    assert_eq!(results[0]["content"], ORGANIC_1);
    assert_eq!(results[0]["index"], 0);
    assert_eq!(results[1]["rank"], 2);
    assert_eq!(results[1]["index"], 1);
    let score = results[0]["similarity_score"].as_f64().unwrap();
    assert!((score - 0.99).abs() < 1e-4, "score = {}", score);

    let resp = client
        .post(format!("{}/search", server.base))
        .json(&json!({ "query": "organic", "top_k": 1 }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_results"], 1);

    let resp = client
        .post(format!("{}/search", server.base))
        .json(&json!({ "top_k": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Query is required");
}

#[tokio::test]
async fn test_history_lists_newest_first() {
    let server = start_server(true).await;

    ask(&server, json!({ "question": "hi" })).await;
    ask(&server, json!({ "question": "What is organic farming?" })).await;
    ask(&server, json!({ "question": "bye" })).await;
    // Rejected requests are not recorded.
    ask(&server, json!({})).await;

    let (status, body) = get_json(&server, "/history").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_count"], 3);
    let questions: Vec<&str> = body["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["question"].as_str().unwrap())
        .collect();
    assert_eq!(questions, vec!["bye", "What is organic farming?", "hi"]);
    assert_eq!(body["history"][0]["answer"], "Goodbye! Come back anytime.");

    let (_, body) = get_json(&server, "/history?limit=1").await;
    assert_eq!(body["total_count"], 1);

    let (status, _) = get_json(&server, "/history?limit=0").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_model_info_and_health() {
    let server = start_server(true).await;

    let (status, info) = get_json(&server, "/model-info").await;
    assert_eq!(status, 200);
    assert_eq!(info["model_loaded"], true);
    assert_eq!(info["total_documents"], 2);
    assert_eq!(info["index_size"], 2);
    assert_eq!(info["dims"], 2);
    assert_eq!(info["embedding_model"], "fake-embed");

    let (status, health) = get_json(&server, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["model_loaded"], true);
}

#[tokio::test]
async fn test_missing_artifacts_run_degraded() {
    let server = start_server(false).await;

    let (status, info) = get_json(&server, "/model-info").await;
    assert_eq!(status, 200);
    assert_eq!(info["model_loaded"], false);
    assert!(info["load_error"].as_str().unwrap().contains("chunks"));

    let (status, body) = ask(&server, json!({ "question": "What is organic farming?" })).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "error": MODEL_NOT_LOADED_MESSAGE }));

    let (status, body) = ask(&server, json!({ "question": "thanks" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["answer"], "You're welcome!");
    assert_eq!(body["model_loaded"], false);
}
