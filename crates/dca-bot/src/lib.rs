//! DCA auto-invest bot application.
//!
//! Wires configuration, the scheduling engine, the failover exchange
//! client, and the trade-history sink into one long-running process.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use engine::{Clock, Engine, SystemClock};
pub use error::{AppError, AppResult};
pub use logging::init_logging;
