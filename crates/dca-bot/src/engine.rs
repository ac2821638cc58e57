//! The scheduling loop.
//!
//! Drives the full cycle: refresh fire times, plan the batch window,
//! sleep, then execute each due plan through the failover client,
//! recording outcomes to the history sink. Runs until shutdown.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use dca_core::InvestmentPlan;
use dca_exchange::{FailoverClient, SpotApi};
use dca_history::HistoryWriter;
use dca_schedule::{plan as plan_batch, refresh, ScheduledPlan};

/// Re-scan delay when nothing is due and no sleep bound exists.
const IDLE_RESCAN: Duration = Duration::from_secs(1);

/// Trait for obtaining current wall-clock time, enabling testability.
pub trait Clock: Send + Sync {
    /// Returns the current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// System clock implementation using real local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// The execution engine.
///
/// Owns the plan list for the process lifetime; the schedule calculator
/// and batch planner operate on borrowed references and keep no state
/// between calls. Single logical thread of control: orders within a
/// batch execute serially, in input order.
pub struct Engine<T: SpotApi, C: Clock> {
    plans: Vec<ScheduledPlan>,
    failover: FailoverClient<T>,
    history: HistoryWriter,
    shutdown: CancellationToken,
    clock: C,
}

impl<T: SpotApi, C: Clock> Engine<T, C> {
    /// Create an engine over a validated plan list.
    #[must_use]
    pub fn new(
        plans: Vec<InvestmentPlan>,
        failover: FailoverClient<T>,
        history: HistoryWriter,
        shutdown: CancellationToken,
        clock: C,
    ) -> Self {
        let now = clock.now();
        let plans = plans
            .into_iter()
            .map(|plan| ScheduledPlan::new(plan, now))
            .collect();
        Self {
            plans,
            failover,
            history,
            shutdown,
            clock,
        }
    }

    /// Run the scheduling loop until shutdown is requested.
    ///
    /// Per-order failures are contained inside the failover client and
    /// never stop the loop; only cancellation ends it.
    pub async fn run(mut self) -> AppResult<()> {
        if self.plans.is_empty() {
            return Err(AppError::Config("no plans to schedule".to_string()));
        }

        info!(plans = self.plans.len(), "Scheduler started");

        'cycle: loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let now = self.clock.now();
            refresh(&mut self.plans, now);
            let batch = plan_batch(&self.plans, now);

            match batch.sleep {
                Some(duration) => {
                    debug!(sleep_secs = duration.as_secs(), "Sleeping until batch window");
                    if self.sleep_or_shutdown(duration).await {
                        break 'cycle;
                    }
                }
                None if batch.due.is_empty() => {
                    if self.sleep_or_shutdown(IDLE_RESCAN).await {
                        break 'cycle;
                    }
                }
                None => {}
            }

            for idx in batch.due {
                // The batch sleep consumed wall-clock time; re-derive
                // this plan's remaining wait.
                let remaining = self.plans[idx].next_fire - self.clock.now();
                if let Ok(wait) = remaining.to_std() {
                    if self.sleep_or_shutdown(wait).await {
                        break 'cycle;
                    }
                }

                let plan = &self.plans[idx].plan;
                info!(
                    symbol = %plan.symbol,
                    amount = %plan.quote_amount,
                    "Executing scheduled buy"
                );
                let outcome = self.failover.place_order(plan, &mut self.history).await;
                debug!(
                    symbol = %plan.symbol,
                    success = outcome.is_success(),
                    "Scheduled buy finished"
                );
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }

    /// Sleep for `duration`, or return `true` if shutdown was requested
    /// first.
    async fn sleep_or_shutdown(&self, duration: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(duration) => false,
            () = self.shutdown.cancelled() => {
                info!("Shutdown requested during sleep");
                true
            }
        }
    }
}
