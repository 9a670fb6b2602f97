//! Error taxonomy for the question-answering pipeline.
//!
//! Every request-level failure is one of three kinds, and the HTTP layer
//! maps each kind to a fixed status and message:
//!
//! | Variant | Status | Body |
//! |---------|--------|------|
//! | [`BotError::InvalidInput`] | 400 | the validation message |
//! | [`BotError::ModelUnavailable`] | 500 | `Model not loaded properly` |
//! | [`BotError::Query`] | 500 | a generic apology; details only in logs |

use thiserror::Error;

pub const MODEL_NOT_LOADED_MESSAGE: &str = "Model not loaded properly";
pub const QUERY_FAILED_MESSAGE: &str =
    "Sorry, there was an error processing your question. Please try again.";

#[derive(Error, Debug)]
pub enum BotError {
    #[error("{0}")]
    InvalidInput(String),

    /// Index, corpus, or embedder failed to load at startup.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Embedding, search, or assembly failed for this request.
    #[error("query failed: {0:#}")]
    Query(#[from] anyhow::Error),
}

impl BotError {
    pub fn invalid(message: impl Into<String>) -> Self {
        BotError::InvalidInput(message.into())
    }

    /// Message safe to return to an HTTP caller.
    pub fn public_message(&self) -> String {
        match self {
            BotError::InvalidInput(msg) => msg.clone(),
            BotError::ModelUnavailable(_) => MODEL_NOT_LOADED_MESSAGE.to_string(),
            BotError::Query(_) => QUERY_FAILED_MESSAGE.to_string(),
        }
    }
}

pub type BotResult<T> = std::result::Result<T, BotError>;
