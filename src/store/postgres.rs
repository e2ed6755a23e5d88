//! PostgreSQL article store.
//!
//! Connection credentials come from [`Secrets`](crate::config::Secrets);
//! a missing credential is caught when the store is constructed, before
//! any connection attempt.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row};

use super::{contains_pattern, ArticleRow, ArticleStore, SEARCH_LIMIT};
use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::models::Article;

pub struct PostgresArticleStore {
    options: PgConnectOptions,
    timeout: Duration,
}

impl PostgresArticleStore {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            options: db::postgres_options(config)?,
            timeout: Duration::from_secs(config.db.timeout_secs),
        })
    }

    async fn connect(&self) -> Result<PgConnection> {
        Ok(PgConnection::connect_with(&self.options).await?)
    }

    async fn try_search(&self, query: &str) -> Result<Vec<Article>> {
        let mut conn = self.connect().await?;
        let pattern = contains_pattern(query);

        let rows = sqlx::query(
            r#"
            SELECT title, description, url, category, published_at
            FROM news_articles
            WHERE title ILIKE $1 ESCAPE '\' OR description ILIKE $1 ESCAPE '\'
            ORDER BY published_at DESC NULLS LAST
            LIMIT $2
            "#,
        )
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&mut conn)
        .await?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            let parsed = ArticleRow {
                title: row.try_get("title")?,
                description: row.try_get("description")?,
                url: row.try_get("url")?,
                category: row.try_get("category")?,
                published_at: row.try_get("published_at")?,
            };
            articles.extend(parsed.into_article());
        }

        conn.close().await?;
        Ok(articles)
    }

    async fn try_upsert(&self, articles: &[Article], category: &str) -> Result<u64> {
        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await?;
        let mut inserted = 0u64;

        for article in articles {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM news_articles WHERE title = $1 OR url = $2)",
            )
            .bind(&article.title)
            .bind(&article.url)
            .fetch_one(&mut *tx)
            .await?;
            if exists {
                continue;
            }

            let result = sqlx::query(
                r#"
                INSERT INTO news_articles (title, description, url, category, published_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(&article.title)
            .bind(&article.description)
            .bind(&article.url)
            .bind(category)
            .bind(article.published_at.naive_utc())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        conn.close().await?;
        Ok(inserted)
    }

    async fn try_ensure_schema(&self) -> Result<()> {
        let mut conn = self.connect().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news_articles (
                id SERIAL PRIMARY KEY,
                title TEXT UNIQUE,
                description TEXT,
                url TEXT UNIQUE,
                category TEXT,
                published_at TIMESTAMP
            )
            "#,
        )
        .execute(&mut conn)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_news_articles_published_at \
             ON news_articles(published_at DESC)",
        )
        .execute(&mut conn)
        .await?;

        conn.close().await?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for PostgresArticleStore {
    async fn search(&self, query: &str) -> Vec<Article> {
        match db::bounded(self.timeout, self.try_search(query)).await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(error = %e, query, "article search failed");
                Vec::new()
            }
        }
    }

    async fn upsert(&self, articles: &[Article], category: &str) -> u64 {
        match db::bounded(self.timeout, self.try_upsert(articles, category)).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, category, "saving articles failed");
                0
            }
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        db::bounded(self.timeout, self.try_ensure_schema()).await
    }
}
