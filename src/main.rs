//! # agribot CLI
//!
//! ## Usage
//!
//! ```bash
//! agribot --config ./config/agribot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `agribot init` | Create the history database and run schema migrations |
//! | `agribot serve` | Start the HTTP server |
//! | `agribot ask "<question>"` | Answer a single question |
//! | `agribot search "<query>"` | Show ranked chunks for a query |
//! | `agribot history` | Show recent question/answer pairs |
//! | `agribot info` | Report whether the index and corpus load |

use agribot::bot::AgriBot;
use agribot::config;
use agribot::db;
use agribot::history::HistoryStore;
use agribot::logging;
use agribot::migrate;
use agribot::server;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// agribot: retrieval-based question answering for agriculture.
#[derive(Parser)]
#[command(name = "agribot", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/agribot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the history database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Answer one question and print the answer.
    Ask {
        question: String,

        /// Also append the pair to the history database.
        #[arg(long)]
        record: bool,
    },

    /// Print the nearest corpus chunks for a query.
    Search {
        query: String,

        /// Number of results (defaults to `retrieval.default_search_top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Print recent question/answer pairs, newest first.
    History {
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print load status and index sizes as JSON.
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init_logging(Some(&cfg.logging));

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Ask { question, record } => {
            let bot = AgriBot::load(&cfg).await;
            let answer = bot
                .answer(&question)
                .await
                .map_err(|e| anyhow::anyhow!(e.public_message()))?;
            println!("{}", answer.text);

            if record {
                let history = open_history(&cfg).await?;
                history.record(question.trim(), &answer.text).await?;
            }
        }
        Commands::Search { query, top_k } => {
            let bot = AgriBot::load(&cfg).await;
            let hits = bot
                .search(&query, top_k)
                .await
                .map_err(|e| anyhow::anyhow!(e.public_message()))?;

            if hits.is_empty() {
                println!("No results.");
            }
            for hit in &hits {
                println!("{}. [{:.3}] #{}", hit.rank, hit.similarity_score, hit.index);
                println!("    {}", hit.content.replace('\n', " ").trim());
                println!();
            }
        }
        Commands::History { limit } => {
            let history = open_history(&cfg).await?;
            let records = history
                .recent(limit.unwrap_or(cfg.history.default_limit))
                .await?;

            if records.is_empty() {
                println!("No history.");
            }
            for r in &records {
                println!("[{}] #{}", r.created_at, r.id);
                println!("  Q: {}", r.question);
                println!("  A: {}", r.answer);
                println!();
            }
            if !records.is_empty() {
                let total = history.count().await?;
                println!("Showing {} of {} recorded queries.", records.len(), total);
            }
        }
        Commands::Info => {
            let bot = AgriBot::load(&cfg).await;
            println!("{}", serde_json::to_string_pretty(&bot.info())?);
        }
    }

    Ok(())
}

async fn open_history(cfg: &config::Config) -> anyhow::Result<HistoryStore> {
    let pool = db::connect(cfg)
        .await
        .with_context(|| format!("Failed to open {}", cfg.history.db_path.display()))?;
    migrate::migrate_pool(&pool).await?;
    Ok(HistoryStore::new(pool))
}
