//! # JustiFi CLI (`justifi`)
//!
//! ## Usage
//!
//! ```bash
//! justifi --config ./config/justifi.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `justifi init` | Create the `news_articles` table |
//! | `justifi ingest` | Fetch every configured category and store new articles |
//! | `justifi lookup "<query>"` | Search stored articles, falling back to live news |
//! | `justifi ask "<question>"` | Ask the language model about PDFs |
//! | `justifi serve` | Start the web form and JSON API |
//!
//! `NEWSAPI_KEY` must be set for every command. With the default
//! PostgreSQL backend, `DB_HOST`, `DB_NAME`, `DB_USER` and `DB_PASSWORD`
//! must be set as well.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `justifi=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use justifi::models::NewsCategory;
use justifi::{ask, config, ingest, lookup, migrate, server};

/// JustiFi: legal news lookup and document Q&A.
#[derive(Parser)]
#[command(name = "justifi", version, about = "Legal news lookup and document Q&A")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/justifi.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the article table. Safe to run repeatedly.
    Init,

    /// Fetch news for every configured category and store new articles.
    Ingest,

    /// Look up legal news.
    ///
    /// Stored articles are searched first; when nothing matches, a live
    /// news search is made. Queries with no results are recorded in the
    /// unanswered query log.
    Lookup {
        /// Keywords to search for.
        query: String,

        /// Category filter for the live search, e.g. `"Human Rights"`.
        #[arg(long)]
        category: Option<String>,
    },

    /// Ask a question about legal documents.
    ///
    /// Without `--pdf`, every PDF in the configured document directory
    /// is used as context.
    Ask {
        /// The question.
        query: String,

        /// PDF files to use as context (repeatable).
        #[arg(long = "pdf")]
        pdfs: Vec<PathBuf>,
    },

    /// Start the web server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("justifi=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest => {
            ingest::run_ingest(&cfg).await?;
        }
        Commands::Lookup { query, category } => {
            let category = match category {
                Some(raw) => NewsCategory::parse(&raw).ok_or_else(|| {
                    anyhow::anyhow!(
                        "unknown category '{}'; expected one of: {}",
                        raw,
                        NewsCategory::ALL.map(NewsCategory::label).join(", ")
                    )
                })?,
                None => NewsCategory::All,
            };
            lookup::run_lookup(&cfg, &query, category).await?;
        }
        Commands::Ask { query, pdfs } => {
            ask::run_ask(&cfg, &query, pdfs).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
