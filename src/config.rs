//! Application configuration.
//!
//! Non-secret settings come from a TOML file (`--config`, default
//! `./config/justifi.toml`). Credentials come from the environment:
//! `NEWSAPI_KEY` always, and `DB_HOST`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`
//! (plus optional `DB_PORT`) when the PostgreSQL backend is selected.
//!
//! A missing credential is a [`ConfigError`] at load time; nothing connects
//! with empty credentials. The resulting [`Config`] is built once in `main`
//! and passed by reference to every component.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the news search API key.
pub const ENV_NEWSAPI_KEY: &str = "NEWSAPI_KEY";
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_NAME: &str = "DB_NAME";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub query_log: QueryLogConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Resolved from the environment, never from the file.
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbBackend {
    #[default]
    Postgres,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default)]
    pub backend: DbBackend,
    /// SQLite database file. Ignored by the PostgreSQL backend.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_db_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: DbBackend::default(),
            path: default_db_path(),
            timeout_secs: default_db_timeout_secs(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/justifi.sqlite")
}
fn default_db_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsConfig {
    #[serde(default = "default_news_base_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_news_base_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_news_base_url() -> String {
    "https://newsapi.org/v2/everything".to_string()
}
fn default_http_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model_name")]
    pub model: String,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_model_endpoint(),
            model: default_model_name(),
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

fn default_model_endpoint() -> String {
    "http://127.0.0.1:11434/api/generate".to_string()
}
fn default_model_name() -> String {
    "gemma2:2b".to_string()
}
fn default_model_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    /// How many leading chunks form the model context.
    #[serde(default = "default_context_chunks")]
    pub context_chunks: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            context_chunks: default_context_chunks(),
        }
    }
}

fn default_chunk_size() -> usize {
    crate::chunk::DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    crate::chunk::DEFAULT_OVERLAP
}
fn default_context_chunks() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    #[serde(default = "default_documents_dir")]
    pub dir: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: default_documents_dir(),
        }
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("legal_documents")
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryLogConfig {
    #[serde(default = "default_query_log_path")]
    pub path: PathBuf,
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            path: default_query_log_path(),
        }
    }
}

fn default_query_log_path() -> PathBuf {
    PathBuf::from("unanswered_queries.log")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_ingest_categories")]
    pub categories: Vec<IngestCategory>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            categories: default_ingest_categories(),
        }
    }
}

/// A named keyword set pulled by the batch ingestion job.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct IngestCategory {
    pub name: String,
    pub keywords: String,
}

fn default_ingest_categories() -> Vec<IngestCategory> {
    [
        ("societal_laws", "society laws, public policy"),
        ("human_rights", "human rights"),
        ("criminal_law", "criminal law, crime policy"),
        ("civil_law", "civil rights, civil litigation"),
        ("constitutional_law", "constitutional law, amendments"),
        ("corporate_law", "corporate law, business regulations"),
    ]
    .into_iter()
    .map(|(name, keywords)| IngestCategory {
        name: name.to_string(),
        keywords: keywords.to_string(),
    })
    .collect()
}

/// Credentials resolved from the environment.
#[derive(Clone, Default)]
pub struct Secrets {
    pub news_api_key: String,
    pub postgres: Option<PostgresCredentials>,
}

#[derive(Clone)]
pub struct PostgresCredentials {
    pub host: String,
    pub port: Option<u16>,
    pub database: String,
    pub user: String,
    pub password: String,
}

// Keep credentials out of debug output.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("news_api_key", &"<redacted>")
            .field("postgres", &self.postgres.as_ref().map(|p| &p.host))
            .finish()
    }
}

impl Secrets {
    /// Resolve credentials through `lookup` (normally `std::env::var`).
    ///
    /// Empty values count as missing.
    pub fn resolve<F>(backend: DbBackend, lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };

        let news_api_key = required(ENV_NEWSAPI_KEY)?;

        let postgres = match backend {
            DbBackend::Sqlite => None,
            DbBackend::Postgres => {
                let port = match lookup(ENV_DB_PORT).filter(|v| !v.trim().is_empty()) {
                    Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                        ConfigError::Invalid(format!("{} must be a port number", ENV_DB_PORT))
                    })?),
                    None => None,
                };
                Some(PostgresCredentials {
                    host: required(ENV_DB_HOST)?,
                    port,
                    database: required(ENV_DB_NAME)?,
                    user: required(ENV_DB_USER)?,
                    password: required(ENV_DB_PASSWORD)?,
                })
            }
        };

        Ok(Self {
            news_api_key,
            postgres,
        })
    }
}

impl Config {
    /// Defaults with a SQLite database at `db_path`. Used by tests and by
    /// commands that never touch external credentials.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        let mut config = Config::default();
        config.db.backend = DbBackend::Sqlite;
        config.db.path = db_path.into();
        config
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunking.chunk_size must be > 0".to_string(),
            ));
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }
        if self.chunking.context_chunks == 0 {
            return Err(ConfigError::Invalid(
                "chunking.context_chunks must be >= 1".to_string(),
            ));
        }
        if self.db.timeout_secs == 0 || self.news.timeout_secs == 0 || self.model.timeout_secs == 0
        {
            return Err(ConfigError::Invalid(
                "timeout_secs values must be > 0".to_string(),
            ));
        }
        if self.ingest.categories.iter().any(|c| c.keywords.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "ingest.categories entries need non-empty keywords".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse and validate `content`, resolving secrets through `lookup`.
pub fn parse_config<F>(content: &str, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    config.secrets = Secrets::resolve(config.db.backend, lookup)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_sqlite_needs_only_news_key() {
        let cfg = parse_config(
            "[db]\nbackend = \"sqlite\"\npath = \"/tmp/x.sqlite\"\n",
            env(&[(ENV_NEWSAPI_KEY, "k")]),
        )
        .unwrap();
        assert_eq!(cfg.db.backend, DbBackend::Sqlite);
        assert_eq!(cfg.secrets.news_api_key, "k");
        assert!(cfg.secrets.postgres.is_none());
        assert_eq!(cfg.chunking.chunk_size, 512);
        assert_eq!(cfg.chunking.overlap, 50);
        assert_eq!(cfg.ingest.categories.len(), 6);
    }

    #[test]
    fn test_missing_news_key_fails_fast() {
        let err = parse_config("[db]\nbackend = \"sqlite\"\n", env(&[])).unwrap_err();
        let cfg_err = err.downcast_ref::<ConfigError>().unwrap();
        assert_eq!(cfg_err, &ConfigError::MissingEnv(ENV_NEWSAPI_KEY));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = parse_config("", env(&[(ENV_NEWSAPI_KEY, "  ")])).unwrap_err();
        assert!(err.to_string().contains(ENV_NEWSAPI_KEY));
    }

    #[test]
    fn test_postgres_requires_db_credentials() {
        let err = parse_config(
            "",
            env(&[
                (ENV_NEWSAPI_KEY, "k"),
                (ENV_DB_HOST, "localhost"),
                (ENV_DB_NAME, "postgres"),
                (ENV_DB_USER, "postgres"),
            ]),
        )
        .unwrap_err();
        let cfg_err = err.downcast_ref::<ConfigError>().unwrap();
        assert_eq!(cfg_err, &ConfigError::MissingEnv(ENV_DB_PASSWORD));
    }

    #[test]
    fn test_postgres_credentials_resolved() {
        let cfg = parse_config(
            "",
            env(&[
                (ENV_NEWSAPI_KEY, "k"),
                (ENV_DB_HOST, "db.internal"),
                (ENV_DB_PORT, "5433"),
                (ENV_DB_NAME, "news"),
                (ENV_DB_USER, "app"),
                (ENV_DB_PASSWORD, "secret"),
            ]),
        )
        .unwrap();
        let pg = cfg.secrets.postgres.unwrap();
        assert_eq!(pg.host, "db.internal");
        assert_eq!(pg.port, Some(5433));
        assert_eq!(pg.database, "news");
    }

    #[test]
    fn test_overlap_not_smaller_than_chunk_size_rejected() {
        let err = parse_config(
            "[db]\nbackend = \"sqlite\"\n[chunking]\nchunk_size = 10\noverlap = 10\n",
            env(&[(ENV_NEWSAPI_KEY, "k")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_custom_ingest_categories() {
        let cfg = parse_config(
            r#"
[db]
backend = "sqlite"

[[ingest.categories]]
name = "tax_law"
keywords = "tax law, irs"
"#,
            env(&[(ENV_NEWSAPI_KEY, "k")]),
        )
        .unwrap();
        assert_eq!(
            cfg.ingest.categories,
            vec![IngestCategory {
                name: "tax_law".to_string(),
                keywords: "tax law, irs".to_string()
            }]
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let secrets = Secrets {
            news_api_key: "super-secret".to_string(),
            postgres: None,
        };
        assert!(!format!("{:?}", secrets).contains("super-secret"));
    }
}
