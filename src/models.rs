//! Core data types that flow through the question-answering pipeline.
//!
//! These are the shapes returned by the [`AgriBot`](crate::bot::AgriBot)
//! service and serialized by the HTTP server.

use serde::Serialize;

/// One `(distance, chunk index)` pair from a k-NN query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Squared Euclidean distance; smaller is closer.
    pub distance: f32,
    pub index: usize,
}

/// A ranked search result, matching the `/search` response item shape.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit {
    /// 1-based position in the result list.
    pub rank: usize,
    pub content: String,
    /// `1 - distance`.
    pub similarity_score: f32,
    pub index: usize,
}

/// How an answer was produced.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// Small-talk table hit; retrieval was skipped.
    Canned,
    /// Best distance was over the confidence threshold.
    LowConfidence,
    /// Assembled from retrieved chunks.
    Retrieved,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

/// A persisted question/answer pair.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

/// Load status and sizes, matching the `/model-info` response shape.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_loaded: bool,
    pub model_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_documents: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dims: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}
