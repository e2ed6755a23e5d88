//! Error taxonomy shared by the store, fetcher, model client, and chunker.
//!
//! Only [`Error::Configuration`] is fatal. Store and fetcher failures are
//! logged and turned into empty results before they reach the lookup flow;
//! the variants exist so those layers can describe what went wrong.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration. Reported at startup.
    #[error("configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigError),

    /// Database or network failure that the caller recovers from.
    #[error("I/O error: {0}")]
    TransientIo(String),

    /// An upstream service answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Malformed parameters (e.g. chunk overlap >= chunk size).
    #[error("invalid argument: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::TransientIo(format!("database: {}", err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::TransientIo(format!("http: {}", err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::TransientIo(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::TransientIo("operation timed out".to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
