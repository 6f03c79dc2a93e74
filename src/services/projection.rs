use chrono::NaiveDate;

use crate::models::plan::PlanPeriod;
use crate::services::period::{workday_progress, WorkdayPolicy};

/// Project the end-of-period deviation (percent, one decimal) for a metric
/// from its accumulated actual value.
///
/// Returns `None` unless the plan value, the accumulated actual and the plan
/// period are all known. A zero plan maps to 0% when nothing was booked and
/// to a flat 100% otherwise; this mirrors how the product sidesteps an
/// unbounded ratio and is preserved for compatibility.
pub fn project(
    plan_value: Option<f64>,
    accumulated_actual: Option<f64>,
    period: Option<PlanPeriod>,
    reference: NaiveDate,
) -> Option<f64> {
    project_with_policy(
        plan_value,
        accumulated_actual,
        period,
        reference,
        WorkdayPolicy::default(),
    )
}

pub fn project_with_policy(
    plan_value: Option<f64>,
    accumulated_actual: Option<f64>,
    period: Option<PlanPeriod>,
    reference: NaiveDate,
    policy: WorkdayPolicy,
) -> Option<f64> {
    let plan = plan_value?;
    let actual = accumulated_actual?;
    let period = period?;

    if plan == 0.0 {
        return Some(if actual == 0.0 { 0.0 } else { 100.0 });
    }

    let progress = workday_progress(period, reference, policy);

    let deviation = if progress.passed == 0 || progress.total == 0 {
        // Nothing to extrapolate from yet; report the raw shortfall.
        (actual - plan) / plan * 100.0
    } else {
        let daily_average = actual / progress.passed as f64;
        let remaining = progress.total.saturating_sub(progress.passed) as f64;
        let projected_final = daily_average * remaining + actual;
        (projected_final - plan) / plan * 100.0
    };

    Some(round_percent(deviation))
}

fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
