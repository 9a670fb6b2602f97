//! # agribot
//!
//! Retrieval-based question answering for agriculture.
//!
//! A question is normalized, checked against a small table of canned
//! conversational replies, and otherwise embedded and matched against a
//! prebuilt index of corpus chunk vectors. The closest chunks are stitched
//! into an answer, or a fixed fallback is returned when nothing is close
//! enough.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌───────────┐
//! │  HTTP /  │──▶│ Normalizer │──▶│ Embedder │──▶│ Flat L2   │
//! │   CLI    │   │  (canned)  │   │          │   │  index    │
//! └────┬─────┘   └────────────┘   └──────────┘   └─────┬─────┘
//!      │                                               ▼
//!      │         ┌──────────┐                   ┌───────────┐
//!      └────────▶│ History  │◀──────────────────│ Assembler │
//!                │ (SQLite) │                   └───────────┘
//!                └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! agribot init                          # create history database
//! agribot info                          # check artifacts load
//! agribot ask "What is organic farming?"
//! agribot serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`errors`] | Request error taxonomy |
//! | [`models`] | Core data types |
//! | [`normalizer`] | Query normalization and canned replies |
//! | [`embedding`] | Embedder abstraction and providers |
//! | [`index`] | Chunk corpus and k-NN index |
//! | [`assembler`] | Answer assembly |
//! | [`bot`] | The question-answering service |
//! | [`history`] | Persisted question/answer log |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod assembler;
pub mod bot;
pub mod config;
pub mod db;
pub mod embedding;
pub mod errors;
pub mod history;
pub mod index;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod normalizer;
pub mod server;
