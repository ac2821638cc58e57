//! Error types for dca-history.

use thiserror::Error;

/// History sink errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for history operations.
pub type HistoryResult<T> = std::result::Result<T, HistoryError>;
