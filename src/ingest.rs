//! Batch news ingestion.
//!
//! For each configured category, in order: one search with the category's
//! keywords, then one insert-if-absent pass tagging every article with the
//! category name. Categories run sequentially; a category whose search
//! returns nothing is reported and skipped.

use anyhow::Result;
use serde::Serialize;

use crate::config::{Config, IngestCategory};
use crate::news::{NewsApiClient, NewsFetcher};
use crate::store::{self, ArticleStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub fetched: usize,
    pub inserted: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub categories: Vec<CategoryReport>,
}

impl IngestReport {
    pub fn total_inserted(&self) -> u64 {
        self.categories.iter().map(|c| c.inserted).sum()
    }
}

/// Pull every category into the store.
pub async fn ingest_categories(
    store: &dyn ArticleStore,
    fetcher: &dyn NewsFetcher,
    categories: &[IngestCategory],
) -> Result<IngestReport> {
    store.ensure_schema().await?;

    let mut report = IngestReport::default();
    for category in categories {
        tracing::info!(category = %category.name, "fetching news");
        let articles = fetcher.fetch(&category.keywords, None).await;

        let inserted = if articles.is_empty() {
            tracing::info!(category = %category.name, "no articles found");
            0
        } else {
            let inserted = store.upsert(&articles, &category.name).await;
            tracing::info!(
                category = %category.name,
                fetched = articles.len(),
                inserted,
                "saved articles"
            );
            inserted
        };

        report.categories.push(CategoryReport {
            category: category.name.clone(),
            fetched: articles.len(),
            inserted,
        });
    }

    Ok(report)
}

/// CLI entry point for `justifi ingest`.
pub async fn run_ingest(config: &Config) -> Result<()> {
    let store = store::open_store(config)?;
    let fetcher = NewsApiClient::new(config)?;

    let report = ingest_categories(store.as_ref(), &fetcher, &config.ingest.categories).await?;

    println!("ingest");
    for c in &report.categories {
        println!(
            "  {:<20} fetched: {:<4} inserted: {}",
            c.category, c.fetched, c.inserted
        );
    }
    println!("  total inserted: {}", report.total_inserted());
    println!("ok");
    Ok(())
}
