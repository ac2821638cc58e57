//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] dca_core::CoreError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] dca_exchange::ExchangeError),

    #[error("History error: {0}")]
    History(#[from] dca_history::HistoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
