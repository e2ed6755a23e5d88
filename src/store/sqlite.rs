//! SQLite article store.
//!
//! SQLite's `LIKE` folds ASCII only, so rows carry lowercased shadow copies
//! of `title` and `description` (`title_lc`, `description_lc`) written on
//! insert, and searches match those against a lowercased pattern.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Row};

use super::{contains_pattern, ArticleRow, ArticleStore, SEARCH_LIMIT};
use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::models::Article;

pub struct SqliteArticleStore {
    options: SqliteConnectOptions,
    timeout: Duration,
}

impl SqliteArticleStore {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            options: db::sqlite_options(config)?,
            timeout: Duration::from_secs(config.db.timeout_secs),
        })
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        Ok(SqliteConnection::connect_with(&self.options).await?)
    }

    async fn try_search(&self, query: &str) -> Result<Vec<Article>> {
        let mut conn = self.connect().await?;
        let pattern = contains_pattern(&query.to_lowercase());

        let rows = sqlx::query(
            r#"
            SELECT title, description, url, category, published_at
            FROM news_articles
            WHERE title_lc LIKE ?1 ESCAPE '\' OR description_lc LIKE ?1 ESCAPE '\'
            ORDER BY published_at DESC
            LIMIT ?2
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
                "SELECT EXISTS(SELECT 1 FROM news_articles WHERE title = ?1 OR url = ?2)",
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
                INSERT INTO news_articles
                    (title, description, url, category, published_at, title_lc, description_lc)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(&article.title)
            .bind(&article.description)
            .bind(&article.url)
            .bind(category)
            .bind(article.published_at.naive_utc())
            .bind(article.title.to_lowercase())
            .bind(article.description.as_deref().map(str::to_lowercase))
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
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                description TEXT,
                url TEXT NOT NULL UNIQUE,
                category TEXT,
                published_at TIMESTAMP,
                title_lc TEXT,
                description_lc TEXT
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
impl ArticleStore for SqliteArticleStore {
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
