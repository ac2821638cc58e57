//! Recurring buy instructions and their load-time validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{CoreError, Result};

/// How often a plan fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Once per week at [weekday, hour, minute].
    Weekly,
    /// Once per day at [hour, minute].
    Daily,
    /// Once per hour at [minute].
    Hourly,
    /// Every minute at second 0.
    Minutely,
}

impl Frequency {
    /// Number of offset components this frequency expects.
    #[must_use]
    pub fn offset_len(&self) -> usize {
        match self {
            Frequency::Weekly => 3,
            Frequency::Daily => 2,
            Frequency::Hourly => 1,
            Frequency::Minutely => 0,
        }
    }
}

/// One recurring buy instruction.
///
/// The offset in `at` is interpreted per `frequency`:
/// - Weekly: `[weekday 0-6 (0 = Monday), hour 0-23, minute 0-59]`
/// - Daily: `[hour 0-23, minute 0-59]`
/// - Hourly: `[minute 0-59]`
/// - Minutely: `[]`
///
/// `symbol` and `quote_amount` are opaque to the scheduler and passed
/// through to order execution unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentPlan {
    /// Recurrence kind.
    pub frequency: Frequency,
    /// Time-of-day/weekday offset, length and ranges per `frequency`.
    #[serde(default)]
    pub at: Vec<u32>,
    /// Trading pair symbol (e.g., "BTCUSDT").
    pub symbol: String,
    /// Quote-currency amount to spend per execution.
    pub quote_amount: Decimal,
}

impl InvestmentPlan {
    /// Check that the offset matches the frequency and the trade
    /// parameters are usable.
    ///
    /// Called once at configuration load time, not per cycle. A failure
    /// here is fatal: malformed plans are rejected at startup, never
    /// skipped silently.
    pub fn validate(&self) -> Result<()> {
        let expected = self.frequency.offset_len();
        if self.at.len() != expected {
            return Err(CoreError::InvalidSchedule(format!(
                "{:?} plan for {} expects {} offset values, got {}",
                self.frequency,
                self.symbol,
                expected,
                self.at.len()
            )));
        }

        let ranges: &[(u32, &str)] = match self.frequency {
            Frequency::Weekly => &[(7, "weekday"), (24, "hour"), (60, "minute")],
            Frequency::Daily => &[(24, "hour"), (60, "minute")],
            Frequency::Hourly => &[(60, "minute")],
            Frequency::Minutely => &[],
        };
        for (&value, &(limit, name)) in self.at.iter().zip(ranges.iter()) {
            if value >= limit {
                return Err(CoreError::InvalidSchedule(format!(
                    "{:?} plan for {}: {} {} out of range (must be < {})",
                    self.frequency, self.symbol, name, value, limit
                )));
            }
        }

        if self.symbol.is_empty() {
            return Err(CoreError::InvalidPlan("empty symbol".to_string()));
        }
        if self.quote_amount <= Decimal::ZERO {
            return Err(CoreError::InvalidPlan(format!(
                "quote_amount for {} must be positive, got {}",
                self.symbol, self.quote_amount
            )));
        }

        Ok(())
    }
}

/// Validate a whole plan list.
///
/// Every invalid plan is logged before the first error is returned, so a
/// config with several mistakes reports all of them in one run.
pub fn validate_plans(plans: &[InvestmentPlan]) -> Result<()> {
    let mut first_err = None;
    for (idx, plan) in plans.iter().enumerate() {
        if let Err(e) = plan.validate() {
            error!(plan = idx, error = %e, "Invalid plan in configuration");
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
