//! Core domain types for the DCA auto-invest bot.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Frequency`, `InvestmentPlan`: recurring buy instructions
//! - `TradeOutcome`, `FillReport`, `OrderRejection`: execution results
//! - `OutcomeSink`: recording seam for the trade-history log

pub mod error;
pub mod outcome;
pub mod plan;

pub use error::{CoreError, Result};
pub use outcome::{
    FillReport, OrderRejection, OutcomeSink, TradeOutcome, MIN_NOTIONAL_ERROR_CODE,
};
pub use plan::{validate_plans, Frequency, InvestmentPlan};
