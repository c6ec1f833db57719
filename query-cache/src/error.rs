//! Error types for the query cache

use thiserror::Error;

/// Boxed error returned by the real execution path
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for query cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Query cache error types
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache store could not be reached, timed out, or rejected the command
    #[error("Cache store unavailable: {0}")]
    StoreUnavailable(String),

    /// The real execution path failed. Never cached, never retried.
    #[error("Query execution failed: {0}")]
    Execution(#[source] BoxError),

    /// A filter or result could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A cached payload exists but does not decode into a known shape
    #[error("Stale cache payload: {0}")]
    StaleDeserialization(String),

    /// A plain record could not be turned into a domain object
    #[error("Rehydration failed: {0}")]
    Rehydration(String),

    /// Invalid store URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// Wrap any error from the real execution path
    pub fn execution(err: impl Into<BoxError>) -> Self {
        Self::Execution(err.into())
    }

    /// Whether this error came from the cache store rather than the query itself
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
