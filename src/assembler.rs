//! Answer assembly from retrieved chunks.
//!
//! 1. No neighbors, or best distance above the confidence threshold →
//!    fixed low-confidence reply.
//! 2. Fetch each neighbor's chunk text, skipping indices outside the corpus.
//! 3. Join with single spaces and collapse whitespace runs.
//! 4. Over the word cap → keep the first N words and append `...`.

use crate::index::Corpus;
use crate::models::{Answer, AnswerSource, Neighbor};

pub const LOW_CONFIDENCE_ANSWER: &str = "Sorry, I don't have enough information on that yet.";

#[derive(Debug, Clone, Copy)]
pub struct AssemblyParams {
    /// Maximum accepted best-match distance.
    pub confidence_threshold: f32,
    /// Word cap; `0` means unlimited.
    pub max_words: usize,
}

pub fn assemble_answer(neighbors: &[Neighbor], corpus: &Corpus, params: AssemblyParams) -> Answer {
    let best = match neighbors.first() {
        Some(n) if n.distance <= params.confidence_threshold => n,
        _ => return low_confidence(),
    };
    tracing::debug!(distance = best.distance, index = best.index, "best match");

    let texts: Vec<&str> = neighbors
        .iter()
        .filter_map(|n| {
            let text = corpus.get(n.index);
            if text.is_none() {
                tracing::warn!(
                    index = n.index,
                    corpus_len = corpus.len(),
                    "neighbor out of corpus range, skipped"
                );
            }
            text
        })
        .collect();

    let combined = collapse_whitespace(&texts.join(" "));
    if combined.is_empty() {
        return low_confidence();
    }

    Answer {
        text: truncate_words(&combined, params.max_words),
        source: AnswerSource::Retrieved,
    }
}

fn low_confidence() -> Answer {
    Answer {
        text: LOW_CONFIDENCE_ANSWER.to_string(),
        source: AnswerSource::LowConfidence,
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the first `max_words` words, appending `...` if anything was cut.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    if max_words == 0 {
        return text.to_string();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    format!("{}...", words[..max_words].join(" "))
}
