use anyhow::Result;

use crate::config::Config;
use crate::store;

/// Create the `news_articles` table on the configured backend. Safe to run
/// repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let store = store::open_store(config)?;
    store.ensure_schema().await?;
    Ok(())
}
