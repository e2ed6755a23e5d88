//! # JustiFi
//!
//! A legal news and document Q&A assistant.
//!
//! JustiFi keeps a table of categorized legal news articles, answers keyword
//! lookups from that table with a live news search as fallback, and answers
//! free-text questions about uploaded PDFs by prompting a locally hosted
//! language model with text drawn from those PDFs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌─────────────────┐
//! │ News API │──▶│  Ingest  │──▶│ news_articles   │
//! └────┬─────┘   └──────────┘   │ (Postgres/SQLite)│
//!      │ fallback               └───────┬─────────┘
//!      ▼                                ▼
//! ┌──────────┐                    ┌──────────┐
//! │  Lookup  │◀───────────────────│  Store   │
//! └────┬─────┘                    └──────────┘
//!      │            ┌──────────┐   ┌──────────┐
//!      │            │ PDFs     │──▶│  Ask     │──▶ local model
//!      ▼            └──────────┘   └────┬─────┘
//! ┌────────────────────────────────────┴─────┐
//! │            CLI  /  Web (axum)            │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export NEWSAPI_KEY=...
//! justifi init                         # create news_articles
//! justifi ingest                       # pull every category
//! justifi lookup "corporate"           # store first, live fallback
//! justifi ask "Is this clause valid?" --pdf lease.pdf
//! justifi serve                        # web form + JSON API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment secrets |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Article and category types |
//! | [`db`] | Connection options and bounded operations |
//! | [`store`] | Article persistence (Postgres, SQLite) |
//! | [`news`] | News search API client |
//! | [`lookup`] | Store-first lookup with live fallback |
//! | [`ingest`] | Batch category ingestion |
//! | [`query_log`] | Unanswered query log |
//! | [`chunk`] | Word-window chunking |
//! | [`extract`] | PDF text extraction |
//! | [`library`] | Uploaded document directory |
//! | [`llm`] | Local language model client |
//! | [`ask`] | Document question answering |
//! | [`migrate`] | Schema setup |
//! | [`server`] | Web form and JSON API |

pub mod ask;
pub mod chunk;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod library;
pub mod llm;
pub mod lookup;
pub mod migrate;
pub mod models;
pub mod news;
pub mod query_log;
pub mod server;
pub mod store;
