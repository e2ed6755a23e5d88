//! Core data models.
//!
//! [`Article`] is the single record type that flows between the news API,
//! the `news_articles` table, the lookup flow, and the web/CLI output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One news item. `title` and `url` are each unique in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub category: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Category choices offered by the query form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NewsCategory {
    #[default]
    All,
    #[serde(rename = "Criminal Law")]
    CriminalLaw,
    #[serde(rename = "Corporate Law")]
    CorporateLaw,
    #[serde(rename = "Constitutional Law")]
    ConstitutionalLaw,
    #[serde(rename = "Human Rights")]
    HumanRights,
    #[serde(rename = "Environmental Law")]
    EnvironmentalLaw,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 6] = [
        NewsCategory::All,
        NewsCategory::CriminalLaw,
        NewsCategory::CorporateLaw,
        NewsCategory::ConstitutionalLaw,
        NewsCategory::HumanRights,
        NewsCategory::EnvironmentalLaw,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NewsCategory::All => "All",
            NewsCategory::CriminalLaw => "Criminal Law",
            NewsCategory::CorporateLaw => "Corporate Law",
            NewsCategory::ConstitutionalLaw => "Constitutional Law",
            NewsCategory::HumanRights => "Human Rights",
            NewsCategory::EnvironmentalLaw => "Environmental Law",
        }
    }

    /// Label to pass to the fetcher; `All` means no category filter.
    pub fn as_filter(self) -> Option<&'static str> {
        match self {
            NewsCategory::All => None,
            other => Some(other.label()),
        }
    }

    /// Parse a form/CLI value. Empty input maps to `All`.
    pub fn parse(value: &str) -> Option<NewsCategory> {
        let value = value.trim();
        if value.is_empty() {
            return Some(NewsCategory::All);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
