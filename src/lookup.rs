//! Store-first news lookup with live fallback.
//!
//! ```text
//! query ──▶ ArticleStore::search ──(hits)──▶ Store results
//!                  │
//!               (empty)
//!                  ▼
//!          NewsFetcher::fetch ──(hits)──▶ Live results (not persisted)
//!                  │
//!               (empty)
//!                  ▼
//!        QueryLog::append(now, query) ──▶ no results
//! ```
//!
//! Each stage is attempted once, in order. Neither the store nor the
//! fetcher can fail the lookup; they report problems through `tracing`
//! and return nothing.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::config::Config;
use crate::models::{Article, NewsCategory};
use crate::news::{NewsApiClient, NewsFetcher};
use crate::query_log::QueryLog;
use crate::store::{self, ArticleStore};

/// Where the returned articles came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Store,
    Live,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub source: ResultSource,
    pub articles: Vec<Article>,
}

impl LookupResult {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

pub struct Lookup<'a> {
    store: &'a dyn ArticleStore,
    fetcher: &'a dyn NewsFetcher,
    log: &'a QueryLog,
}

impl<'a> Lookup<'a> {
    pub fn new(
        store: &'a dyn ArticleStore,
        fetcher: &'a dyn NewsFetcher,
        log: &'a QueryLog,
    ) -> Self {
        Self {
            store,
            fetcher,
            log,
        }
    }

    pub async fn lookup(&self, query: &str, category: Option<&str>) -> LookupResult {
        let stored = self.store.search(query).await;
        if !stored.is_empty() {
            tracing::debug!(query, count = stored.len(), "answered from store");
            return LookupResult {
                source: ResultSource::Store,
                articles: stored,
            };
        }

        let live = self.fetcher.fetch(query, category).await;
        if !live.is_empty() {
            tracing::debug!(query, count = live.len(), "answered from live search");
            return LookupResult {
                source: ResultSource::Live,
                articles: live,
            };
        }

        tracing::info!(query, "no articles found");
        if let Err(e) = self.log.append(Utc::now(), query).await {
            tracing::warn!(
                error = %e,
                path = %self.log.path().display(),
                "could not record unanswered query"
            );
        }

        LookupResult {
            source: ResultSource::None,
            articles: Vec::new(),
        }
    }
}

/// Topics offered when a lookup comes back empty.
pub fn suggested_topics() -> Vec<&'static str> {
    NewsCategory::ALL
        .into_iter()
        .filter_map(NewsCategory::as_filter)
        .collect()
}

/// CLI entry point for `justifi lookup`.
pub async fn run_lookup(config: &Config, query: &str, category: NewsCategory) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let store = store::open_store(config)?;
    let fetcher = NewsApiClient::new(config)?;
    let log = QueryLog::new(&config.query_log.path);

    let result = Lookup::new(store.as_ref(), &fetcher, &log)
        .lookup(query.trim(), category.as_filter())
        .await;

    if result.is_empty() {
        println!("No results. Try one of these topics:");
        for topic in suggested_topics() {
            println!("  - {}", topic);
        }
        return Ok(());
    }

    let origin = match result.source {
        ResultSource::Store => "saved articles",
        _ => "live search",
    };
    println!("{} result(s) from {}", result.articles.len(), origin);
    println!();
    for (i, article) in result.articles.iter().enumerate() {
        println!("{}. {}", i + 1, article.title);
        println!("    published: {}", article.published_at.format("%Y-%m-%d"));
        if let Some(ref category) = article.category {
            println!("    category: {}", category);
        }
        if let Some(ref description) = article.description {
            println!("    {}", description.replace('\n', " ").trim());
        }
        println!("    url: {}", article.url);
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_topics_exclude_all() {
        let topics = suggested_topics();
        assert_eq!(topics.len(), 5);
        assert!(!topics.contains(&"All"));
        assert!(topics.contains(&"Environmental Law"));
    }
}
