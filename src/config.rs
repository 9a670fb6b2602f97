use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::normalizer::CannedResponse;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Replaces the built-in small-talk table when non-empty.
    #[serde(default)]
    pub canned: Vec<CannedResponse>,
}

/// Locations of the prebuilt retrieval artifacts.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// JSON array of chunk strings, in index order.
    pub chunks_path: PathBuf,
    /// Flat vector file (see [`crate::index::FlatL2Index::read_from`]).
    pub vectors_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_answer_top_k")]
    pub answer_top_k: usize,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// `0` disables truncation.
    #[serde(default = "default_max_answer_words")]
    pub max_answer_words: usize,
    #[serde(default = "default_search_top_k")]
    pub default_search_top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            answer_top_k: default_answer_top_k(),
            confidence_threshold: default_confidence_threshold(),
            max_answer_words: default_max_answer_words(),
            default_search_top_k: default_search_top_k(),
            max_top_k: default_max_top_k(),
        }
    }
}

fn default_answer_top_k() -> usize {
    3
}
fn default_confidence_threshold() -> f32 {
    1.0
}
fn default_max_answer_words() -> usize {
    100
}
fn default_search_top_k() -> usize {
    5
}
fn default_max_top_k() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_history_enabled")]
    pub enabled: bool,
    #[serde(default = "default_history_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_history_limit")]
    pub default_limit: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_history_enabled(),
            db_path: default_history_path(),
            default_limit: default_history_limit(),
        }
    }
}

fn default_history_enabled() -> bool {
    true
}
fn default_history_path() -> PathBuf {
    PathBuf::from("./data/agribot.sqlite")
}
fn default_history_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let retrieval = &config.retrieval;

    if retrieval.answer_top_k == 0 {
        anyhow::bail!("retrieval.answer_top_k must be >= 1");
    }

    if !retrieval.confidence_threshold.is_finite() || retrieval.confidence_threshold < 0.0 {
        anyhow::bail!("retrieval.confidence_threshold must be a finite value >= 0");
    }

    if retrieval.max_top_k == 0 {
        anyhow::bail!("retrieval.max_top_k must be >= 1");
    }

    if !(1..=retrieval.max_top_k).contains(&retrieval.default_search_top_k) {
        anyhow::bail!(
            "retrieval.default_search_top_k must be in [1, {}]",
            retrieval.max_top_k
        );
    }

    if config.history.default_limit < 1 {
        anyhow::bail!("history.default_limit must be >= 1");
    }

    if config.canned.iter().any(|c| c.trigger.trim().is_empty()) {
        anyhow::bail!("canned trigger must not be empty");
    }

    // Validate embedding
    if config.embedding.is_enabled() && config.embedding.model.is_none() {
        anyhow::bail!(
            "embedding.model must be specified when provider is '{}'",
            config.embedding.provider
        );
    }

    if config.embedding.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    Ok(())
}
