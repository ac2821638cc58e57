//! Append-only trade history log.
//!
//! One plain-text file per calendar month. Each outcome is a single
//! line, written with open/append/flush/close per write so no file
//! handle is held across the scheduler's sleeps.

pub mod error;
pub mod writer;

pub use error::{HistoryError, HistoryResult};
pub use writer::HistoryWriter;
