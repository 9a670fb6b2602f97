//! Shared fixtures: a fake Ollama embedding endpoint and on-disk artifacts.
#![allow(dead_code)]

use agribot::index::FlatL2Index;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const ORGANIC_1: &str = "Organic farming avoids synthetic inputs.";
pub const ORGANIC_2: &str = "It relies on compost and crop rotation.";

pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Deterministic stand-in for a sentence-embedding model.
///
/// - mentions "organic"    → near chunks 0 and 1
/// - mentions "explode"    → HTTP 500
/// - anything else         → far from every chunk
fn fake_vector(text: &str) -> Option<Vec<f32>> {
    if text.contains("explode") {
        None
    } else if text.contains("organic") {
        Some(vec![0.0, 0.0])
    } else {
        Some(vec![100.0, -100.0])
    }
}

async fn handle_embed(
    State(calls): State<Arc<AtomicUsize>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, axum::http::StatusCode> {
    calls.fetch_add(1, Ordering::SeqCst);
    let text = body["input"][0].as_str().unwrap_or("").to_string();
    match fake_vector(&text) {
        Some(v) => Ok(Json(json!({ "embeddings": [v] }))),
        None => Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Starts the fake Ollama server in the background; returns its base URL.
pub async fn spawn_fake_ollama() -> String {
    spawn_counting_ollama().await.0
}

/// Like [`spawn_fake_ollama`], also returning the number of embed requests served.
pub async fn spawn_counting_ollama() -> (String, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/api/embed", post(handle_embed))
        .with_state(calls.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (format!("http://{}", addr), calls)
}

/// Writes `chunks.json` and `vectors.agix` with two chunks.
pub fn write_artifacts(dir: &Path) {
    let chunks = vec![ORGANIC_1, ORGANIC_2];
    fs::write(dir.join("chunks.json"), serde_json::to_string(&chunks).unwrap()).unwrap();

    let index = FlatL2Index::from_vectors(2, &[vec![0.0, 0.1], vec![0.0, 0.2]]).unwrap();
    index.write_to(&dir.join("vectors.agix")).unwrap();
}

/// Writes a config file and returns its path.
pub fn write_config(tmp: &TempDir, port: u16, ollama_url: Option<&str>) -> PathBuf {
    let root = tmp.path();
    let embedding = match ollama_url {
        Some(url) => format!(
            r#"[embedding]
provider = "ollama"
model = "fake-embed"
dims = 2
url = "{}"
timeout_secs = 5
"#,
            url
        ),
        None => String::new(),
    };

    let content = format!(
        r#"[index]
chunks_path = "{root}/chunks.json"
vectors_path = "{root}/vectors.agix"

[server]
bind = "127.0.0.1:{port}"

[history]
db_path = "{root}/data/agribot.sqlite"

{embedding}"#,
        root = root.display(),
        port = port,
        embedding = embedding,
    );

    let path = root.join("agribot.toml");
    fs::write(&path, content).unwrap();
    path
}

pub async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}
