//! Error types for dca-exchange.

use dca_core::OrderRejection;
use thiserror::Error;

/// Exchange adapter errors.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Definitive API-level rejection. Will not change by switching
    /// endpoints, so never retried.
    #[error("Order rejected: status {}, code {}: {}", .0.status_code, .0.error_code, .0.error_message)]
    Api(OrderRejection),

    /// Network error, timeout, server error, or undecodable response.
    /// Triggers endpoint rotation and retry.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        ExchangeError::Transport(e.to_string())
    }
}

/// Result type alias for exchange operations.
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
