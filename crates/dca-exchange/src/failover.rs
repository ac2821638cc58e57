//! Order execution with endpoint rotation and bounded retry.

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::api::SpotApi;
use crate::error::ExchangeError;
use dca_core::{InvestmentPlan, OutcomeSink, TradeOutcome};

/// Default candidate endpoints, tried in rotation.
pub const DEFAULT_ENDPOINTS: [&str; 4] = [
    "https://api.binance.com",
    "https://api1.binance.com",
    "https://api2.binance.com",
    "https://api3.binance.com",
];

/// Default order retry budget.
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Exchange client with endpoint failover.
///
/// Wraps a [`SpotApi`] transport with a rotating list of candidate base
/// URLs. Transient failures rotate to the next endpoint (round-robin,
/// wrapping) and retry the same order with identical parameters, up to
/// `max_retries` attempts. Definitive rejections are never retried.
///
/// Every outcome, including each transient failure before its retry, is
/// recorded to the sink before `place_order` returns.
pub struct FailoverClient<T: SpotApi> {
    api: T,
    endpoints: Vec<String>,
    cursor: usize,
    max_retries: u32,
}

impl<T: SpotApi> FailoverClient<T> {
    /// Create a new failover client.
    ///
    /// `endpoints` must be non-empty; the first entry is used until a
    /// transient failure forces a rotation.
    #[must_use]
    pub fn new(api: T, endpoints: Vec<String>, max_retries: u32) -> Self {
        debug_assert!(!endpoints.is_empty());
        Self {
            api,
            endpoints,
            cursor: 0,
            max_retries,
        }
    }

    /// Create with the default endpoint list and retry budget.
    #[must_use]
    pub fn with_defaults(api: T) -> Self {
        Self::new(
            api,
            DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_MAX_RETRIES,
        )
    }

    /// The endpoint the next attempt will use.
    #[must_use]
    pub fn current_endpoint(&self) -> &str {
        &self.endpoints[self.cursor]
    }

    /// Advance to the next endpoint, wrapping.
    fn rotate(&mut self) {
        self.cursor = (self.cursor + 1) % self.endpoints.len();
    }

    /// Execute one plan's market buy.
    ///
    /// Returns a terminal [`TradeOutcome`]: `Success`, `Rejected`, or
    /// `RetriesExhausted`. Failures never propagate as errors; the
    /// scheduling loop must keep running for the other plans regardless
    /// of one plan's failure history.
    pub async fn place_order(
        &mut self,
        plan: &InvestmentPlan,
        sink: &mut dyn OutcomeSink,
    ) -> TradeOutcome {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let endpoint = self.current_endpoint().to_string();

            match self
                .api
                .place_market_buy(&endpoint, &plan.symbol, plan.quote_amount)
                .await
            {
                Ok(fill) => {
                    info!(
                        symbol = %fill.symbol,
                        status = %fill.status,
                        price = %fill.price,
                        qty = %fill.executed_qty,
                        amount = %fill.cumulative_quote,
                        "Order filled"
                    );
                    let outcome = TradeOutcome::Success(fill);
                    sink.record(plan, &outcome, Local::now().naive_local());
                    return outcome;
                }
                Err(ExchangeError::Api(rejection)) => {
                    error!(
                        symbol = %plan.symbol,
                        status = rejection.status_code,
                        code = rejection.error_code,
                        message = %rejection.error_message,
                        "Order rejected"
                    );
                    if rejection.is_min_notional() {
                        error!(symbol = %plan.symbol, "Order amount is too low");
                    }
                    let outcome = TradeOutcome::Rejected(rejection);
                    sink.record(plan, &outcome, Local::now().naive_local());
                    return outcome;
                }
                Err(e) => {
                    warn!(
                        symbol = %plan.symbol,
                        endpoint = %endpoint,
                        attempt = attempts,
                        error = %e,
                        "Trying a different server"
                    );
                    sink.record(
                        plan,
                        &TradeOutcome::TransientFailure {
                            detail: e.to_string(),
                        },
                        Local::now().naive_local(),
                    );

                    if attempts >= self.max_retries {
                        error!(
                            symbol = %plan.symbol,
                            attempts,
                            "Retry budget exhausted, giving up on this fire"
                        );
                        let outcome = TradeOutcome::RetriesExhausted { attempts };
                        sink.record(plan, &outcome, Local::now().naive_local());
                        return outcome;
                    }

                    self.rotate();
                    let probe_endpoint = self.current_endpoint().to_string();
                    match self.api.server_time(&probe_endpoint).await {
                        Ok(_) => debug!(endpoint = %probe_endpoint, "Endpoint reachable"),
                        Err(probe_err) => warn!(
                            endpoint = %probe_endpoint,
                            error = %probe_err,
                            "Probe failed, retrying anyway"
                        ),
                    }
                }
            }
        }
    }
}
