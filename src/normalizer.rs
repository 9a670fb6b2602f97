//! Query normalization and the small-talk short circuit.
//!
//! Questions are lowercased and trimmed. If the result contains any trigger
//! substring from the canned table, the matching reply is returned and no
//! retrieval happens. Triggers are checked in table order, first match wins,
//! so `"hi, thanks"` answers with the greeting.

use serde::Deserialize;

/// One small-talk entry: a trigger substring and its fixed reply.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CannedResponse {
    pub trigger: String,
    pub response: String,
}

impl CannedResponse {
    pub fn new(trigger: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            response: response.into(),
        }
    }
}

pub fn default_canned_responses() -> Vec<CannedResponse> {
    vec![
        CannedResponse::new("hi", "Hello! How can I assist you with agriculture today?"),
        CannedResponse::new("how are you", "I'm doing well — ready to help you farm smarter!"),
        CannedResponse::new("thanks", "You're welcome!"),
        CannedResponse::new(
            "what's your name",
            "I'm MbewuBot — your smart agriculture assistant!",
        ),
        CannedResponse::new("bye", "Goodbye! Come back anytime."),
    ]
}

#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    canned: Vec<CannedResponse>,
}

impl QueryNormalizer {
    /// Builds a normalizer; an empty table falls back to the defaults.
    pub fn new(canned: Vec<CannedResponse>) -> Self {
        let canned = if canned.is_empty() {
            default_canned_responses()
        } else {
            canned
                .into_iter()
                .map(|c| CannedResponse {
                    trigger: c.trigger.trim().to_lowercase(),
                    response: c.response,
                })
                .collect()
        };
        Self { canned }
    }

    pub fn normalize(question: &str) -> String {
        question.trim().to_lowercase()
    }

    /// Returns the canned reply for an already-normalized question.
    pub fn canned_reply(&self, normalized: &str) -> Option<&str> {
        if normalized.is_empty() {
            return None;
        }
        self.canned
            .iter()
            .find(|c| normalized.contains(c.trigger.as_str()))
            .map(|c| c.response.as_str())
    }
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
