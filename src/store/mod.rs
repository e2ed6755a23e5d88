//! Article storage.
//!
//! The [`ArticleStore`] trait is the accessor over the `news_articles`
//! table. Two `sqlx` backends implement it: [`PostgresArticleStore`] for
//! deployments and [`SqliteArticleStore`] for local use and tests.
//!
//! | Method | Failure behaviour |
//! |--------|-------------------|
//! | [`search`](ArticleStore::search) | logged, returns an empty vector |
//! | [`upsert`](ArticleStore::upsert) | logged, returns 0 |
//! | [`ensure_schema`](ArticleStore::ensure_schema) | returned to the caller |
//!
//! Every call opens its own connection and closes it before returning.

pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::config::{Config, DbBackend};
use crate::error::Result;
use crate::models::Article;

pub use postgres::PostgresArticleStore;
pub use sqlite::SqliteArticleStore;

/// Maximum rows returned by [`ArticleStore::search`].
pub const SEARCH_LIMIT: i64 = 5;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Up to [`SEARCH_LIMIT`] articles whose title or description contains
    /// `query` (case-insensitive), most recently published first.
    async fn search(&self, query: &str) -> Vec<Article>;

    /// Insert each article unless its title or url is already stored.
    /// Stored rows carry `category`. Returns the number inserted.
    async fn upsert(&self, articles: &[Article], category: &str) -> u64;

    /// Create the table and its unique constraints if absent.
    async fn ensure_schema(&self) -> Result<()>;
}

/// Build the store selected by `[db].backend`.
pub fn open_store(config: &Config) -> Result<Box<dyn ArticleStore>> {
    let store: Box<dyn ArticleStore> = match config.db.backend {
        DbBackend::Postgres => Box::new(PostgresArticleStore::new(config)?),
        DbBackend::Sqlite => Box::new(SqliteArticleStore::new(config)?),
    };
    Ok(store)
}

/// `%query%` with LIKE metacharacters escaped by `\`.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Columns as read back from either backend.
pub(crate) struct ArticleRow {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub published_at: Option<NaiveDateTime>,
}

impl ArticleRow {
    /// Rows written by older tooling may have NULL keys; those are dropped.
    pub fn into_article(self) -> Option<Article> {
        Some(Article {
            title: self.title?,
            description: self.description,
            url: self.url?,
            category: self.category,
            published_at: self.published_at?.and_utc(),
        })
    }
}
