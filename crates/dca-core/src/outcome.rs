//! Execution results and the recording seam for the trade-history log.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::plan::InvestmentPlan;

/// Exchange error code for "order amount below the exchange minimum".
pub const MIN_NOTIONAL_ERROR_CODE: i64 = -1013;

/// Fill details of a successful market buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    /// Trading pair symbol as echoed by the exchange.
    pub symbol: String,
    /// Order status string from the exchange (e.g., "FILLED").
    pub status: String,
    /// Price of the last fill.
    pub price: Decimal,
    /// Total executed base-asset quantity.
    pub executed_qty: Decimal,
    /// Cumulative quote-asset amount spent.
    pub cumulative_quote: Decimal,
}

/// A definitive API-level rejection.
///
/// The exchange refused the order as semantically or economically
/// invalid; the condition will not change by switching endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejection {
    /// HTTP status code of the response.
    pub status_code: u16,
    /// Exchange-level error code.
    pub error_code: i64,
    /// Exchange-level error message.
    pub error_message: String,
}

impl OrderRejection {
    /// Whether the order was rejected for being below the exchange
    /// minimum amount.
    #[must_use]
    pub fn is_min_notional(&self) -> bool {
        self.error_code == MIN_NOTIONAL_ERROR_CODE
    }
}

/// Result of one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// Order filled.
    Success(FillReport),
    /// Exchange refused the order; not retried.
    Rejected(OrderRejection),
    /// Network/timeout/server failure; recorded before the retry that
    /// follows it.
    TransientFailure {
        /// Human-readable failure detail.
        detail: String,
    },
    /// The retry budget ran out without a definitive answer.
    RetriesExhausted {
        /// Number of order attempts made.
        attempts: u32,
    },
}

impl TradeOutcome {
    /// Returns true if the order filled.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if no further attempt for this fire will happen.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::TransientFailure { .. })
    }
}

/// Sink for execution outcomes.
///
/// Every outcome, including each transient failure before its retry, is
/// recorded before control returns to the scheduling loop, so a
/// post-mortem can reconstruct what happened even if the process later
/// crashes. Implementations must not propagate write failures.
pub trait OutcomeSink: Send {
    /// Record one outcome for one plan at wall-clock time `now`.
    fn record(&mut self, plan: &InvestmentPlan, outcome: &TradeOutcome, now: NaiveDateTime);
}
