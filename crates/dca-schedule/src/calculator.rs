//! Next-fire-time computation for recurring plans.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

use dca_core::{Frequency, InvestmentPlan};

/// An investment plan paired with its next scheduled fire time.
///
/// The schedule state lives in memory only; a process restart recomputes
/// it from scratch. `next_fire` is updated exclusively by [`refresh`]
/// between planning cycles.
#[derive(Debug, Clone)]
pub struct ScheduledPlan {
    /// The recurring instruction.
    pub plan: InvestmentPlan,
    /// Absolute wall-clock time of the next scheduled execution.
    /// Always strictly in the future relative to the `now` used to
    /// compute it.
    pub next_fire: NaiveDateTime,
}

impl ScheduledPlan {
    /// Pair a plan with its first fire time after `now`.
    #[must_use]
    pub fn new(plan: InvestmentPlan, now: NaiveDateTime) -> Self {
        let next_fire = next_fire_after(&plan, now);
        Self { plan, next_fire }
    }
}

/// Compute the next fire time strictly after `now`.
///
/// A candidate equal to `now` counts as already passed and rolls forward
/// one full period, so a plan never fires twice for the same instant.
///
/// Pure function of (plan, now). The plan's offset must have been
/// validated at load time; weekday 0 is Monday, matching
/// `Weekday::num_days_from_monday`.
#[must_use]
pub fn next_fire_after(plan: &InvestmentPlan, now: NaiveDateTime) -> NaiveDateTime {
    match plan.frequency {
        Frequency::Weekly => {
            let (weekday, hour, minute) = (plan.at[0], plan.at[1], plan.at[2]);
            let today_at = now
                .date()
                .and_hms_opt(hour, minute, 0)
                .expect("offset validated at load time");
            let day_shift =
                (i64::from(weekday) - i64::from(now.weekday().num_days_from_monday())).rem_euclid(7);
            let candidate = today_at + Duration::days(day_shift);
            if candidate <= now {
                candidate + Duration::days(7)
            } else {
                candidate
            }
        }
        Frequency::Daily => {
            let (hour, minute) = (plan.at[0], plan.at[1]);
            let candidate = now
                .date()
                .and_hms_opt(hour, minute, 0)
                .expect("offset validated at load time");
            if candidate <= now {
                candidate + Duration::days(1)
            } else {
                candidate
            }
        }
        Frequency::Hourly => {
            let minute = plan.at[0];
            let candidate = now
                .date()
                .and_hms_opt(now.hour(), minute, 0)
                .expect("offset validated at load time");
            if candidate <= now {
                candidate + Duration::hours(1)
            } else {
                candidate
            }
        }
        Frequency::Minutely => {
            let candidate = now
                .date()
                .and_hms_opt(now.hour(), now.minute(), 0)
                .expect("in-range by construction");
            if candidate <= now {
                candidate + Duration::minutes(1)
            } else {
                candidate
            }
        }
    }
}

/// Recompute `next_fire` for every plan against the same `now`.
///
/// Called once per planning cycle for all plans, since `now` advances
/// between cycles.
pub fn refresh(plans: &mut [ScheduledPlan], now: NaiveDateTime) {
    for scheduled in plans.iter_mut() {
        scheduled.next_fire = next_fire_after(&scheduled.plan, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_plan(frequency: Frequency, at: Vec<u32>) -> InvestmentPlan {
        InvestmentPlan {
            frequency,
            at,
            symbol: "BTCUSDT".to_string(),
            quote_amount: dec!(50),
        }
    }

    /// 2024-01-01 is a Monday.
    fn monday_at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    // ========================================================================
    // Weekly
    // ========================================================================

    #[test]
    fn test_weekly_later_this_week() {
        // Wednesday 10:00 rule, asked on Monday morning.
        let plan = sample_plan(Frequency::Weekly, vec![2, 10, 0]);
        let next = next_fire_after(&plan, monday_at(8, 0, 0));
        assert_eq!(next, at(2024, 1, 3, 10, 0, 0));
    }

    #[test]
    fn test_weekly_same_day_still_ahead() {
        let plan = sample_plan(Frequency::Weekly, vec![0, 10, 0]);
        let next = next_fire_after(&plan, monday_at(9, 59, 59));
        assert_eq!(next, at(2024, 1, 1, 10, 0, 0));
    }

    #[test]
    fn test_weekly_same_day_already_passed_rolls_a_week() {
        // Monday 10:00 rule at Monday 10:00:01 -> the following Monday.
        let plan = sample_plan(Frequency::Weekly, vec![0, 10, 0]);
        let next = next_fire_after(&plan, monday_at(10, 0, 1));
        assert_eq!(next, at(2024, 1, 8, 10, 0, 0));
    }

    #[test]
    fn test_weekly_equality_rolls_a_week() {
        let plan = sample_plan(Frequency::Weekly, vec![0, 10, 0]);
        let next = next_fire_after(&plan, monday_at(10, 0, 0));
        assert_eq!(next, at(2024, 1, 8, 10, 0, 0));
    }

    #[test]
    fn test_weekly_target_earlier_in_week_wraps() {
        // Monday rule asked on a Wednesday lands on next week's Monday.
        let plan = sample_plan(Frequency::Weekly, vec![0, 10, 0]);
        let wednesday = at(2024, 1, 3, 12, 0, 0);
        let next = next_fire_after(&plan, wednesday);
        assert_eq!(next, at(2024, 1, 8, 10, 0, 0));
    }

    // ========================================================================
    // Daily
    // ========================================================================

    #[test]
    fn test_daily_still_ahead_today() {
        let plan = sample_plan(Frequency::Daily, vec![23, 59]);
        let next = next_fire_after(&plan, monday_at(10, 0, 0));
        assert_eq!(next, at(2024, 1, 1, 23, 59, 0));
    }

    #[test]
    fn test_daily_already_passed_rolls_a_day() {
        let plan = sample_plan(Frequency::Daily, vec![23, 59]);
        let next = next_fire_after(&plan, monday_at(23, 59, 30));
        assert_eq!(next, at(2024, 1, 2, 23, 59, 0));
    }

    // ========================================================================
    // Hourly
    // ========================================================================

    #[test]
    fn test_hourly_still_ahead_this_hour() {
        let plan = sample_plan(Frequency::Hourly, vec![30]);
        let next = next_fire_after(&plan, monday_at(10, 15, 0));
        assert_eq!(next, at(2024, 1, 1, 10, 30, 0));
    }

    #[test]
    fn test_hourly_passed_rolls_an_hour() {
        let plan = sample_plan(Frequency::Hourly, vec![30]);
        let next = next_fire_after(&plan, monday_at(10, 45, 0));
        assert_eq!(next, at(2024, 1, 1, 11, 30, 0));
    }

    #[test]
    fn test_hourly_equality_rolls_an_hour() {
        let plan = sample_plan(Frequency::Hourly, vec![30]);
        let next = next_fire_after(&plan, monday_at(10, 30, 0));
        assert_eq!(next, at(2024, 1, 1, 11, 30, 0));
    }

    // ========================================================================
    // Minutely
    // ========================================================================

    #[test]
    fn test_minutely_mid_minute() {
        let plan = sample_plan(Frequency::Minutely, vec![]);
        let next = next_fire_after(&plan, monday_at(10, 15, 30));
        assert_eq!(next, at(2024, 1, 1, 10, 16, 0));
    }

    #[test]
    fn test_minutely_equality_rolls_a_minute() {
        let plan = sample_plan(Frequency::Minutely, vec![]);
        let next = next_fire_after(&plan, monday_at(10, 15, 0));
        assert_eq!(next, at(2024, 1, 1, 10, 16, 0));
    }

    // ========================================================================
    // Properties
    // ========================================================================

    #[test]
    fn test_next_fire_strictly_future_for_all_frequencies() {
        let plans = vec![
            sample_plan(Frequency::Weekly, vec![0, 10, 0]),
            sample_plan(Frequency::Daily, vec![10, 0]),
            sample_plan(Frequency::Hourly, vec![0]),
            sample_plan(Frequency::Minutely, vec![]),
        ];
        // Includes the exact-boundary instant for every frequency.
        let nows = [
            monday_at(10, 0, 0),
            monday_at(0, 0, 0),
            monday_at(23, 59, 59),
            monday_at(12, 34, 56),
        ];
        for plan in &plans {
            for now in nows {
                assert!(
                    next_fire_after(plan, now) > now,
                    "{:?} at {} not strictly future",
                    plan.frequency,
                    now
                );
            }
        }
    }

    #[test]
    fn test_refresh_idempotent_for_fixed_now() {
        let now = monday_at(9, 30, 0);
        let mut plans = vec![
            ScheduledPlan::new(sample_plan(Frequency::Weekly, vec![0, 10, 0]), now),
            ScheduledPlan::new(sample_plan(Frequency::Minutely, vec![]), now),
        ];
        let first: Vec<_> = plans.iter().map(|p| p.next_fire).collect();
        refresh(&mut plans, now);
        refresh(&mut plans, now);
        let second: Vec<_> = plans.iter().map(|p| p.next_fire).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_refresh_monotone_across_advancing_now() {
        let plan = sample_plan(Frequency::Hourly, vec![30]);
        let mut prev = next_fire_after(&plan, monday_at(10, 0, 0));
        for second in [1u32, 100, 1800, 1801, 3599] {
            let now = monday_at(10, 0, 0) + Duration::seconds(i64::from(second));
            let next = next_fire_after(&plan, now);
            assert!(next >= prev, "next_fire regressed at +{}s", second);
            prev = next;
        }
        // Once the 10:30 fire has passed, the fire time strictly advances.
        let after = next_fire_after(&plan, monday_at(10, 30, 1));
        assert_eq!(after, at(2024, 1, 1, 11, 30, 0));
    }
}
