//! Error taxonomy for the refresh pipeline and the query layer

use country_feed_adapter::{Feed, SourceError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Failure raised by a [`CountryStore`](crate::store::CountryStore) backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store write failed: {0}")]
    Write(String),

    #[error("store read failed: {0}")]
    Read(String),
}

/// Errors surfaced to callers of the pipeline and the query layer
#[derive(Debug, Error)]
pub enum CacheError {
    /// One of the external feeds failed; the refresh was aborted
    #[error("external data source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// Reconciliation left nothing to persist; the cache was not touched
    #[error("no valid country data to save after processing ({rejected} entries rejected)")]
    NoValidRecords { rejected: usize },

    #[error("storage write failed: {0}")]
    StoreWrite(String),

    #[error("storage read failed: {0}")]
    StoreRead(String),

    #[error("country not found: {name}")]
    NotFound { name: String },

    /// No refresh has produced a summary image yet
    #[error("summary image not found at {}", .0.display())]
    SummaryNotFound(PathBuf),
}

/// Coarse classification for callers choosing a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Upstream is down, retry later
    Unavailable,
    /// Our side is broken
    Internal,
    NotFound,
}

impl ErrorKind {
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Unavailable => 503,
            ErrorKind::Internal => 500,
            ErrorKind::NotFound => 404,
        }
    }
}

impl CacheError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::SourceUnavailable(_) => ErrorKind::Unavailable,
            CacheError::NoValidRecords { .. }
            | CacheError::StoreWrite(_)
            | CacheError::StoreRead(_) => ErrorKind::Internal,
            CacheError::NotFound { .. } | CacheError::SummaryNotFound(_) => ErrorKind::NotFound,
        }
    }

    /// The feed that failed, for source errors
    pub fn failed_feed(&self) -> Option<Feed> {
        match self {
            CacheError::SourceUnavailable(e) => Some(e.feed()),
            _ => None,
        }
    }

    pub fn not_found(name: &str) -> Self {
        CacheError::NotFound {
            name: name.to_string(),
        }
    }
}

impl From<StoreError> for CacheError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Write(reason) => CacheError::StoreWrite(reason),
            StoreError::Read(reason) => CacheError::StoreRead(reason),
        }
    }
}
