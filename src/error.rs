use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BqSyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config not found: {0}")]
    ConfigNotFound(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("BigQuery error: {0}")]
    BigQuery(#[from] gcp_bigquery_client::error::BQError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error(
        "Uncommitted changes detected in {}. Commit or stash changes before running bq-sync pull.",
        .0.display()
    )]
    UncommittedChanges(PathBuf),

    #[error("Invalid resource path '{0}': expected <project>/<dataset>/<table>")]
    InvalidResourcePath(String),

    #[error("Unsupported format '{0}': expected csv or parquet")]
    UnsupportedFormat(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("{0} is not yet implemented")]
    NotImplemented(String),
}

impl From<arrow::error::ArrowError> for BqSyncError {
    fn from(e: arrow::error::ArrowError) -> Self {
        BqSyncError::Export(e.to_string())
    }
}

impl From<parquet::errors::ParquetError> for BqSyncError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        BqSyncError::Export(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BqSyncError>;
