use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

use crate::config::{Config, ConfigError, ENV_DB_HOST};
use crate::error::{Error, Result};

pub fn sqlite_options(config: &Config) -> Result<SqliteConnectOptions> {
    let db_path = &config.db.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    Ok(options)
}

pub fn postgres_options(config: &Config) -> Result<PgConnectOptions> {
    let creds = config
        .secrets
        .postgres
        .as_ref()
        .ok_or(Error::Configuration(ConfigError::MissingEnv(ENV_DB_HOST)))?;

    let mut options = PgConnectOptions::new()
        .host(&creds.host)
        .database(&creds.database)
        .username(&creds.user)
        .password(&creds.password);
    if let Some(port) = creds.port {
        options = options.port(port);
    }
    Ok(options)
}

/// Run `fut`, failing with [`Error::TransientIo`] once `limit` elapses.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut).await?
}
