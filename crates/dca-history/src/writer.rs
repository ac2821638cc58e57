//! Monthly append-only history files.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};
use tracing::warn;

use crate::error::HistoryResult;
use dca_core::{InvestmentPlan, OutcomeSink, TradeOutcome};

/// Trade history writer.
///
/// Writes one line per outcome to `<dir>/<year>_<month>.history.txt`.
/// Each write opens the file in append mode and closes it again, so
/// interrupted runs lose at most the line being written. Write failures
/// are logged and swallowed: history loss must not stop trading.
pub struct HistoryWriter {
    dir: PathBuf,
}

impl HistoryWriter {
    /// Create a writer rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> HistoryResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the history file for the month containing `now`.
    #[must_use]
    pub fn file_path(&self, now: NaiveDateTime) -> PathBuf {
        self.dir
            .join(format!("{}_{}.history.txt", now.year(), now.month()))
    }

    /// Render one outcome as its history line.
    #[must_use]
    pub fn format_line(plan: &InvestmentPlan, outcome: &TradeOutcome, now: NaiveDateTime) -> String {
        let stamp = now.format("%Y/%m/%d, %H:%M:%S");
        match outcome {
            TradeOutcome::Success(fill) => format!(
                "{}, {}, status: {}, price: {}, qty: {}, amount: {}",
                stamp, fill.symbol, fill.status, fill.price, fill.executed_qty, fill.cumulative_quote
            ),
            TradeOutcome::Rejected(rejection) => format!(
                "[Error] {}, {}, status: REJECTED, code: {}, message: {}",
                stamp, plan.symbol, rejection.error_code, rejection.error_message
            ),
            TradeOutcome::TransientFailure { detail } => format!(
                "[Warn] {}, {}, status: TRANSIENT_FAILURE, detail: {}",
                stamp, plan.symbol, detail
            ),
            TradeOutcome::RetriesExhausted { attempts } => format!(
                "[Error] {}, {}, status: MAX_RETRIES_EXCEEDED, attempts: {}",
                stamp, plan.symbol, attempts
            ),
        }
    }

    fn append_line(&self, path: &Path, line: &str) -> HistoryResult<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}

impl OutcomeSink for HistoryWriter {
    fn record(&mut self, plan: &InvestmentPlan, outcome: &TradeOutcome, now: NaiveDateTime) {
        let path = self.file_path(now);
        let line = Self::format_line(plan, outcome, now);
        if let Err(e) = self.append_line(&path, &line) {
            warn!(path = %path.display(), error = %e, "Failed to append history line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dca_core::{FillReport, Frequency, OrderRejection};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample_plan() -> InvestmentPlan {
        InvestmentPlan {
            frequency: Frequency::Daily,
            at: vec![10, 0],
            symbol: "BTCUSDT".to_string(),
            quote_amount: dec!(50),
        }
    }

    fn sample_fill() -> TradeOutcome {
        TradeOutcome::Success(FillReport {
            symbol: "BTCUSDT".to_string(),
            status: "FILLED".to_string(),
            price: dec!(49001.7),
            executed_qty: dec!(0.00102),
            cumulative_quote: dec!(49.99),
        })
    }

    fn jan_first() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 3)
            .unwrap()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_success_line_format() {
        let line = HistoryWriter::format_line(&sample_plan(), &sample_fill(), jan_first());
        assert_eq!(
            line,
            "2024/01/01, 10:00:03, BTCUSDT, status: FILLED, price: 49001.7, qty: 0.00102, amount: 49.99"
        );
    }

    #[test]
    fn test_failure_line_prefixes() {
        let plan = sample_plan();
        let rejected = TradeOutcome::Rejected(OrderRejection {
            status_code: 400,
            error_code: -1013,
            error_message: "Filter failure: NOTIONAL".to_string(),
        });
        assert!(HistoryWriter::format_line(&plan, &rejected, jan_first()).starts_with("[Error] "));

        let transient = TradeOutcome::TransientFailure {
            detail: "connection timed out".to_string(),
        };
        assert!(HistoryWriter::format_line(&plan, &transient, jan_first()).starts_with("[Warn] "));

        let exhausted = TradeOutcome::RetriesExhausted { attempts: 8 };
        let line = HistoryWriter::format_line(&plan, &exhausted, jan_first());
        assert!(line.starts_with("[Error] "));
        assert!(line.contains("attempts: 8"));
    }

    #[test]
    fn test_monthly_file_naming() {
        let temp_dir = TempDir::new().unwrap();
        let writer = HistoryWriter::new(temp_dir.path()).unwrap();

        let path = writer.file_path(jan_first());
        assert_eq!(path.file_name().unwrap(), "2024_1.history.txt");

        let december = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let path = writer.file_path(december);
        assert_eq!(path.file_name().unwrap(), "2023_12.history.txt");
    }

    #[test]
    fn test_record_appends_across_writes() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = HistoryWriter::new(temp_dir.path()).unwrap();
        let plan = sample_plan();

        writer.record(&plan, &sample_fill(), jan_first());
        writer.record(
            &plan,
            &TradeOutcome::TransientFailure {
                detail: "timeout".to_string(),
            },
            jan_first(),
        );
        writer.record(&plan, &sample_fill(), jan_first());

        let lines = read_lines(&writer.file_path(jan_first()));
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("[Warn] "));
    }

    #[test]
    fn test_month_rollover_starts_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = HistoryWriter::new(temp_dir.path()).unwrap();
        let plan = sample_plan();

        let jan = jan_first();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 30)
            .unwrap();

        writer.record(&plan, &sample_fill(), jan);
        writer.record(&plan, &sample_fill(), feb);

        assert_eq!(read_lines(&writer.file_path(jan)).len(), 1);
        assert_eq!(read_lines(&writer.file_path(feb)).len(), 1);
    }
}
