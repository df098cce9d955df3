use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerBaseError {
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Input not found: {0}")]
    MissingInput(PathBuf),

    #[error("No ranking snapshots matching '{pattern}' in {dir}")]
    NoRankings { dir: PathBuf, pattern: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlayerBaseError>;

/// Failure to obtain candidate values for a single player.
///
/// These never abort a batch: the engine logs them and moves on.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("HTTP error {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("Expected page structure missing: {0}")]
    MissingStructure(String),

    #[error("Rate limited by {0}")]
    RateLimited(String),
}

impl SourceError {
    /// Transient failures worth another attempt after backing off.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Network { .. } | SourceError::RateLimited(_) => true,
            SourceError::Http { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            SourceError::NotFound(_) | SourceError::MissingStructure(_) => false,
        }
    }
}
