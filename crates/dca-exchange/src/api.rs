//! Spot trading API transport.
//!
//! Provides a trait-based abstraction over the exchange REST API. This
//! allows for:
//! - Dependency injection for testing
//! - Separation of failover policy from transport
//! - Future flexibility in transport implementation

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExchangeError, ExchangeResult};
use dca_core::{FillReport, OrderRejection};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Trait over the exchange's spot trading API.
///
/// Implementations receive the base URL per call so that the failover
/// layer can rotate endpoints without rebuilding the transport.
pub trait SpotApi: Send + Sync {
    /// Place a market buy spending `quote_amount` of the quote asset.
    fn place_market_buy<'a>(
        &'a self,
        base_url: &'a str,
        symbol: &'a str,
        quote_amount: Decimal,
    ) -> BoxFuture<'a, ExchangeResult<FillReport>>;

    /// Fetch the exchange server time. Used as a lightweight
    /// reachability probe after endpoint rotation.
    fn server_time<'a>(&'a self, base_url: &'a str) -> BoxFuture<'a, ExchangeResult<i64>>;
}

// ============================================================================
// REST implementation
// ============================================================================

/// Market order request body.
#[derive(Debug, Serialize)]
struct MarketBuyRequest<'a> {
    symbol: &'a str,
    side: &'a str,
    #[serde(rename = "type")]
    order_type: &'a str,
    #[serde(rename = "quoteOrderQty")]
    quote_order_qty: Decimal,
}

/// One fill of an executed order.
#[derive(Debug, Deserialize)]
struct Fill {
    price: Decimal,
}

/// Order placement response.
#[derive(Debug, Deserialize)]
struct OrderResponse {
    symbol: String,
    status: String,
    #[serde(rename = "executedQty")]
    executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty")]
    cumulative_quote_qty: Decimal,
    #[serde(default)]
    fills: Vec<Fill>,
}

/// Typed error body returned by the exchange.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// Server time response.
#[derive(Debug, Deserialize)]
struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    server_time: i64,
}

/// reqwest-backed spot API client.
pub struct RestSpotApi {
    client: Client,
    api_key: String,
}

impl RestSpotApi {
    /// Create a new REST client.
    pub fn new(api_key: impl Into<String>) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ExchangeError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    async fn place_market_buy_inner(
        &self,
        base_url: &str,
        symbol: &str,
        quote_amount: Decimal,
    ) -> ExchangeResult<FillReport> {
        let url = format!("{base_url}/api/v3/order");
        let request = MarketBuyRequest {
            symbol,
            side: "BUY",
            order_type: "MARKET",
            quote_order_qty: quote_amount,
        };

        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // A decodable client-error body is a definitive rejection;
            // everything else counts as transient.
            if status.is_client_error() {
                if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&body) {
                    return Err(ExchangeError::Api(OrderRejection {
                        status_code: status.as_u16(),
                        error_code: err.code,
                        error_message: err.msg,
                    }));
                }
            }
            return Err(ExchangeError::Transport(format!("HTTP {status}: {body}")));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::Transport(format!("Failed to parse order response: {e}")))?;

        // The exchange reports per-fill prices; take the last fill's.
        let price = order.fills.last().map(|f| f.price).unwrap_or_default();

        Ok(FillReport {
            symbol: order.symbol,
            status: order.status,
            price,
            executed_qty: order.executed_qty,
            cumulative_quote: order.cumulative_quote_qty,
        })
    }

    async fn server_time_inner(&self, base_url: &str) -> ExchangeResult<i64> {
        let url = format!("{base_url}/api/v3/time");
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Transport(format!("HTTP {status}")));
        }

        let time: ServerTimeResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::Transport(format!("Failed to parse server time: {e}")))?;

        debug!(server_time = time.server_time, "Server time probe ok");
        Ok(time.server_time)
    }
}

impl SpotApi for RestSpotApi {
    fn place_market_buy<'a>(
        &'a self,
        base_url: &'a str,
        symbol: &'a str,
        quote_amount: Decimal,
    ) -> BoxFuture<'a, ExchangeResult<FillReport>> {
        Box::pin(self.place_market_buy_inner(base_url, symbol, quote_amount))
    }

    fn server_time<'a>(&'a self, base_url: &'a str) -> BoxFuture<'a, ExchangeResult<i64>> {
        Box::pin(self.server_time_inner(base_url))
    }
}

impl<T: SpotApi + ?Sized> SpotApi for std::sync::Arc<T> {
    fn place_market_buy<'a>(
        &'a self,
        base_url: &'a str,
        symbol: &'a str,
        quote_amount: Decimal,
    ) -> BoxFuture<'a, ExchangeResult<FillReport>> {
        (**self).place_market_buy(base_url, symbol, quote_amount)
    }

    fn server_time<'a>(&'a self, base_url: &'a str) -> BoxFuture<'a, ExchangeResult<i64>> {
        (**self).server_time(base_url)
    }
}

// ============================================================================
// Mock transport
// ============================================================================

/// A call recorded by [`MockSpotApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// Market buy attempt.
    Buy {
        base_url: String,
        symbol: String,
        quote_amount: Decimal,
    },
    /// Server time probe.
    Time { base_url: String },
}

/// Mock spot API for testing.
///
/// Records every call and replays scripted results in order. With no
/// scripted result queued, buys report a filled order and probes succeed.
#[derive(Default)]
pub struct MockSpotApi {
    calls: Mutex<Vec<MockCall>>,
    buy_results: Mutex<VecDeque<ExchangeResult<FillReport>>>,
    time_results: Mutex<VecDeque<ExchangeResult<i64>>>,
}

impl MockSpotApi {
    /// Create a new mock with no scripted results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next market buy.
    pub fn push_buy_result(&self, result: ExchangeResult<FillReport>) {
        self.buy_results.lock().expect("mock lock").push_back(result);
    }

    /// Queue the result of the next server time probe.
    pub fn push_time_result(&self, result: ExchangeResult<i64>) {
        self.time_results.lock().expect("mock lock").push_back(result);
    }

    /// Get all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().expect("mock lock").clone()
    }

    fn default_fill(symbol: &str, quote_amount: Decimal) -> FillReport {
        FillReport {
            symbol: symbol.to_string(),
            status: "FILLED".to_string(),
            price: Decimal::ONE,
            executed_qty: quote_amount,
            cumulative_quote: quote_amount,
        }
    }
}

impl SpotApi for MockSpotApi {
    fn place_market_buy<'a>(
        &'a self,
        base_url: &'a str,
        symbol: &'a str,
        quote_amount: Decimal,
    ) -> BoxFuture<'a, ExchangeResult<FillReport>> {
        self.calls.lock().expect("mock lock").push(MockCall::Buy {
            base_url: base_url.to_string(),
            symbol: symbol.to_string(),
            quote_amount,
        });
        let result = self
            .buy_results
            .lock()
            .expect("mock lock")
            .pop_front()
            .unwrap_or_else(|| Ok(Self::default_fill(symbol, quote_amount)));
        Box::pin(async move { result })
    }

    fn server_time<'a>(&'a self, base_url: &'a str) -> BoxFuture<'a, ExchangeResult<i64>> {
        self.calls.lock().expect("mock lock").push(MockCall::Time {
            base_url: base_url.to_string(),
        });
        let result = self
            .time_results
            .lock()
            .expect("mock lock")
            .pop_front()
            .unwrap_or(Ok(0));
        Box::pin(async move { result })
    }
}
