//! Error types for dca-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
