use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::plan::PlanPeriod;
use crate::models::report::ReportPeriod;

/// Working-day constants used for scale conversion between daily, weekly and
/// monthly plan values. These are product policy, not calendar facts (real
/// months carry 20-23 working days), so they live in a policy value that can
/// be swapped without touching the algorithms.
pub const WORKDAYS_PER_WEEK: u32 = 5;
pub const WORKDAYS_PER_MONTH: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkdayPolicy {
    pub workdays_per_week: u32,
    pub workdays_per_month: u32,
}

impl Default for WorkdayPolicy {
    fn default() -> Self {
        Self {
            workdays_per_week: WORKDAYS_PER_WEEK,
            workdays_per_month: WORKDAYS_PER_MONTH,
        }
    }
}

impl WorkdayPolicy {
    fn scale(&self, period: ReportPeriod) -> u32 {
        match period {
            ReportPeriod::Day => 1,
            ReportPeriod::Week => self.workdays_per_week,
            ReportPeriod::Month => self.workdays_per_month,
        }
    }
}

/// Elapsed and total working days of a plan window, relative to a reference
/// date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkdayProgress {
    pub passed: u32,
    pub total: u32,
}

/// Monday through Sunday of the reference date's week.
pub fn week_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = reference.weekday().num_days_from_monday() as i64;
    let start = reference - Duration::days(offset);
    (start, start + Duration::days(6))
}

/// First through last calendar day of the reference date's month.
pub fn month_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = reference.with_day(1).unwrap_or(reference);
    let next_month = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    let end = next_month
        .map(|date| date - Duration::days(1))
        .unwrap_or(reference);
    (start, end)
}

/// Calendar bounds of a display window around the reference date.
pub fn period_bounds(period: ReportPeriod, reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    match period {
        ReportPeriod::Day => (reference, reference),
        ReportPeriod::Week => week_bounds(reference),
        ReportPeriod::Month => month_bounds(reference),
    }
}

fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Count of weekdays (Mon-Fri) in `start..=end`; zero for an inverted range.
pub fn workdays_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut count = 0;
    let mut date = start;
    while date <= end {
        if is_workday(date) {
            count += 1;
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    count
}

/// Working days elapsed and total for a plan window as of `reference`.
///
/// Week windows use the policy's nominal length: Mon-Fri map to their ISO
/// weekday number, Sunday counts as nothing elapsed, Saturday as the week
/// already complete. Month windows count the actual weekdays of the
/// reference month, which is why the 22-day constant never appears here.
pub fn workday_progress(
    period: PlanPeriod,
    reference: NaiveDate,
    policy: WorkdayPolicy,
) -> WorkdayProgress {
    match period {
        PlanPeriod::UntilWeekEnd => {
            let passed = match reference.weekday().number_from_monday() {
                6 => policy.workdays_per_week,
                7 => 0,
                weekday => weekday,
            };
            WorkdayProgress {
                passed,
                total: policy.workdays_per_week,
            }
        }
        PlanPeriod::UntilMonthEnd => {
            let (start, end) = month_bounds(reference);
            WorkdayProgress {
                passed: workdays_between(start, reference),
                total: workdays_between(start, end),
            }
        }
    }
}

/// Convert a plan value between period bases, routing through the daily
/// value. Identity when both bases match.
pub fn convert(value: f64, from: ReportPeriod, to: ReportPeriod) -> f64 {
    convert_with_policy(value, from, to, WorkdayPolicy::default())
}

pub fn convert_with_policy(
    value: f64,
    from: ReportPeriod,
    to: ReportPeriod,
    policy: WorkdayPolicy,
) -> f64 {
    if from == to {
        return value;
    }
    let daily = value / policy.scale(from) as f64;
    daily * policy.scale(to) as f64
}
