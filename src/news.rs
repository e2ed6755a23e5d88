//! News search API client.
//!
//! [`NewsFetcher`] is the seam the lookup flow and the ingestion job call
//! through; [`NewsApiClient`] implements it against a NewsAPI-compatible
//! `everything` endpoint:
//!
//! ```text
//! GET {base_url}?q=<keywords [category]>&language=en&sortBy=relevancy&apiKey=<key>
//! ```
//!
//! Only the first page of results is used. Non-success statuses and
//! transport failures are logged and produce an empty result.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::Article;

#[async_trait]
pub trait NewsFetcher: Send + Sync {
    /// Search for `keywords`, narrowed by `category` when given. Returned
    /// articles carry `category` as their category.
    async fn fetch(&self, keywords: &str, category: Option<&str>) -> Vec<Article>;
}

/// Response body of the search endpoint. Only `articles` is read.
#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
pub struct ApiArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

pub struct NewsApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.news.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.news.base_url.clone(),
            api_key: config.secrets.news_api_key.clone(),
        })
    }

    async fn try_fetch(&self, query: &str) -> Result<NewsResponse> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::from(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<NewsResponse>()
            .await
            .map_err(|e| Error::from(e.without_url()))
    }
}

#[async_trait]
impl NewsFetcher for NewsApiClient {
    async fn fetch(&self, keywords: &str, category: Option<&str>) -> Vec<Article> {
        let query = build_query(keywords, category);
        match self.try_fetch(&query).await {
            Ok(body) => {
                let articles = to_articles(body, category);
                tracing::debug!(query = %query, count = articles.len(), "news search complete");
                articles
            }
            Err(Error::Upstream { status, .. }) => {
                tracing::warn!(status, query = %query, "news search returned an error status");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, query = %query, "news search failed");
                Vec::new()
            }
        }
    }
}

/// `keywords` followed by `category`, space-separated.
pub fn build_query(keywords: &str, category: Option<&str>) -> String {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => format!("{} {}", keywords, c),
        None => keywords.to_string(),
    }
}

/// Normalize API records. Records without a title, an http(s) url, or a
/// parseable `publishedAt` cannot be keyed, linked or ordered and are
/// dropped.
pub fn to_articles(body: NewsResponse, category: Option<&str>) -> Vec<Article> {
    body.articles
        .into_iter()
        .filter_map(|raw| {
            let published_at = raw
                .published_at
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|ts| ts.with_timezone(&Utc));
            let url = raw.url.filter(|u| is_web_url(u));
            match (raw.title, url, published_at) {
                (Some(title), Some(url), Some(published_at)) => Some(Article {
                    title,
                    description: raw.description,
                    url,
                    category: category.map(str::to_string),
                    published_at,
                }),
                (title, url, _) => {
                    tracing::debug!(?title, ?url, "skipping incomplete news record");
                    None
                }
            }
        })
        .collect()
}

fn is_web_url(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
