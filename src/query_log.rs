//! Append-only log of queries that produced no results.
//!
//! One line per entry: `YYYY-MM-DD HH:MM:SS: query text`. The file is never
//! read back by the application.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct QueryLog {
    path: PathBuf,
}

impl QueryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, at: DateTime<Utc>, query: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format_entry(at, query).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Newlines in the query are flattened so each entry stays on one line.
fn format_entry(at: DateTime<Utc>, query: &str) -> String {
    let flat = query.replace(['\r', '\n'], " ");
    format!("{}: {}\n", at.format("%Y-%m-%d %H:%M:%S"), flat)
}
