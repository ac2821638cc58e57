//! Exchange REST adapter with endpoint failover.
//!
//! - `SpotApi`: transport trait over the exchange's spot trading API
//! - `RestSpotApi`: reqwest-backed implementation
//! - `FailoverClient`: endpoint rotation with bounded retry around
//!   market-buy execution

pub mod api;
pub mod error;
pub mod failover;

pub use api::{BoxFuture, MockCall, MockSpotApi, RestSpotApi, SpotApi};
pub use error::{ExchangeError, ExchangeResult};
pub use failover::{FailoverClient, DEFAULT_ENDPOINTS, DEFAULT_MAX_RETRIES};
