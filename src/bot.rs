//! The question-answering service.
//!
//! [`AgriBot`] is constructed once at process start and shared by
//! reference (`Arc`) with every request handler. After construction it is
//! read-only, so concurrent requests need no locking here.
//!
//! # Lifecycle
//!
//! - [`AgriBot::load`] reads the corpus and vector index from the paths in
//!   `[index]` and creates the configured embedder. Any failure leaves the
//!   bot in degraded mode: canned replies still work, retrieval returns
//!   [`BotError::ModelUnavailable`].
//! - [`AgriBot::new`] takes already-built parts, for custom binaries and tests.
//!
//! # Pipeline
//!
//! ```text
//! question ─▶ normalize ─▶ canned? ──yes──▶ reply
//!                             │no
//!                             ▼
//!                          embed ─▶ k-NN ─▶ assemble ─▶ reply
//! ```

use anyhow::{anyhow, Context};
use std::sync::Arc;

use crate::assembler::{assemble_answer, AssemblyParams};
use crate::config::{Config, RetrievalConfig};
use crate::embedding::{create_embedder, Embedder};
use crate::errors::{BotError, BotResult};
use crate::index::{Corpus, FlatL2Index, SimilarityIndex};
use crate::models::{Answer, AnswerSource, ModelInfo, Neighbor, SearchHit};
use crate::normalizer::QueryNormalizer;

const MODEL_TYPE: &str = "Flat L2 vector search";
const MODEL_DESCRIPTION: &str = "Agricultural knowledge base with semantic search capabilities";

/// The loaded retrieval artifacts.
#[derive(Clone)]
pub struct Retriever {
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn SimilarityIndex>,
    pub corpus: Arc<Corpus>,
}

impl Retriever {
    /// Embeds `query` and returns up to `k` neighbors.
    async fn neighbors(&self, query: &str, k: usize) -> anyhow::Result<Vec<Neighbor>> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .context("embedding failed")?;

        if vector.len() != self.index.dims() {
            return Err(anyhow!(
                "embedder returned {} dims, index has {}",
                vector.len(),
                self.index.dims()
            ));
        }

        self.index.search(&vector, k).context("index search failed")
    }
}

enum ModelState {
    Loaded(Retriever),
    Unavailable(String),
}

pub struct AgriBot {
    normalizer: QueryNormalizer,
    retrieval: RetrievalConfig,
    state: ModelState,
}

impl AgriBot {
    pub fn new(
        normalizer: QueryNormalizer,
        retrieval: RetrievalConfig,
        retriever: Retriever,
    ) -> Self {
        if retriever.index.len() != retriever.corpus.len() {
            tracing::warn!(
                index_size = retriever.index.len(),
                corpus_size = retriever.corpus.len(),
                "index and corpus sizes differ; out-of-range hits will be skipped"
            );
        }
        Self {
            normalizer,
            retrieval,
            state: ModelState::Loaded(retriever),
        }
    }

    /// A bot that only serves canned replies.
    pub fn degraded(
        normalizer: QueryNormalizer,
        retrieval: RetrievalConfig,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            normalizer,
            retrieval,
            state: ModelState::Unavailable(reason.into()),
        }
    }

    /// Builds the bot from configuration. Never fails: load errors are
    /// logged and the bot starts in degraded mode.
    pub async fn load(config: &Config) -> Self {
        let normalizer = QueryNormalizer::new(config.canned.clone());
        let retrieval = config.retrieval.clone();

        match load_retriever(config).await {
            Ok(retriever) => {
                tracing::info!(
                    chunks = retriever.corpus.len(),
                    vectors = retriever.index.len(),
                    dims = retriever.index.dims(),
                    model = retriever.embedder.model_name(),
                    "retrieval model loaded"
                );
                Self::new(normalizer, retrieval, retriever)
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::error!(
                    error = %reason,
                    "failed to load retrieval model; running degraded"
                );
                Self::degraded(normalizer, retrieval, reason)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded(_))
    }

    fn retriever(&self) -> BotResult<&Retriever> {
        match &self.state {
            ModelState::Loaded(r) => Ok(r),
            ModelState::Unavailable(reason) => Err(BotError::ModelUnavailable(reason.clone())),
        }
    }

    /// Answers a question: canned reply, low-confidence fallback, or an
    /// answer assembled from the top retrieved chunks.
    pub async fn answer(&self, question: &str) -> BotResult<Answer> {
        if question.trim().is_empty() {
            return Err(BotError::invalid("Question is required"));
        }

        let normalized = QueryNormalizer::normalize(question);
        if let Some(reply) = self.normalizer.canned_reply(&normalized) {
            tracing::debug!(question = %normalized, "canned reply");
            return Ok(Answer {
                text: reply.to_string(),
                source: AnswerSource::Canned,
            });
        }

        let retriever = self.retriever()?;
        let neighbors = retriever
            .neighbors(&normalized, self.retrieval.answer_top_k)
            .await?;

        let answer = assemble_answer(
            &neighbors,
            &retriever.corpus,
            AssemblyParams {
                confidence_threshold: self.retrieval.confidence_threshold,
                max_words: self.retrieval.max_answer_words,
            },
        );
        tracing::info!(question = %normalized, source = ?answer.source, "answered");
        Ok(answer)
    }

    /// Ranked chunks for `query`. `top_k` defaults to
    /// `retrieval.default_search_top_k`.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> BotResult<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(BotError::invalid("Query is required"));
        }

        let top_k = top_k.unwrap_or(self.retrieval.default_search_top_k);
        if top_k == 0 || top_k > self.retrieval.max_top_k {
            return Err(BotError::invalid(format!(
                "top_k must be between 1 and {}",
                self.retrieval.max_top_k
            )));
        }

        let retriever = self.retriever()?;
        let neighbors = retriever.neighbors(query, top_k).await?;

        let hits = neighbors
            .iter()
            .filter_map(|n| retriever.corpus.get(n.index).map(|text| (n, text)))
            .enumerate()
            .map(|(i, (n, text))| SearchHit {
                rank: i + 1,
                content: text.to_string(),
                similarity_score: 1.0 - n.distance,
                index: n.index,
            })
            .collect();

        Ok(hits)
    }

    pub fn info(&self) -> ModelInfo {
        let mut info = ModelInfo {
            model_loaded: self.is_loaded(),
            model_type: MODEL_TYPE.to_string(),
            description: MODEL_DESCRIPTION.to_string(),
            total_documents: None,
            index_size: None,
            embedding_model: None,
            dims: None,
            load_error: None,
        };

        match &self.state {
            ModelState::Loaded(r) => {
                info.total_documents = Some(r.corpus.len());
                info.index_size = Some(r.index.len());
                info.embedding_model = Some(r.embedder.model_name().to_string());
                info.dims = Some(r.index.dims());
            }
            ModelState::Unavailable(reason) => info.load_error = Some(reason.clone()),
        }

        info
    }
}

async fn load_retriever(config: &Config) -> anyhow::Result<Retriever> {
    if !config.embedding.is_enabled() {
        anyhow::bail!("embedding provider is disabled");
    }

    let corpus = Corpus::load(&config.index.chunks_path)?;
    let index = FlatL2Index::read_from(&config.index.vectors_path)?;
    let embedder = create_embedder(&config.embedding)
        .await
        .context("failed to create embedder")?;

    if embedder.dims() != index.dims() {
        anyhow::bail!(
            "embedder '{}' produces {} dims but the index has {}",
            embedder.model_name(),
            embedder.dims(),
            index.dims()
        );
    }

    Ok(Retriever {
        embedder,
        index: Arc::new(index),
        corpus: Arc::new(corpus),
    })
}
