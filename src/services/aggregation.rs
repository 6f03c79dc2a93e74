use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::record::DailyRecord;
use crate::models::report::MetricTotals;

/// Reduce daily records over `[start_date, end_date]` (inclusive on both
/// ends) into per-metric plan/actual totals, rounded to whole numbers.
///
/// Records outside the window are filtered out, absent or non-finite values
/// contribute zero, and a metric never referenced by an in-range record is
/// absent from the output rather than present with zero.
pub fn aggregate(
    records: &[DailyRecord],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> HashMap<String, MetricTotals> {
    let mut totals: HashMap<String, (f64, f64)> = HashMap::new();

    for record in records
        .iter()
        .filter(|record| record.date >= start_date && record.date <= end_date)
    {
        for (metric_id, value) in &record.metric_values {
            let entry = totals.entry(metric_id.clone()).or_insert((0.0, 0.0));
            entry.0 += contribution(value.plan);
            entry.1 += contribution(value.actual);
        }
    }

    totals
        .into_iter()
        .map(|(metric_id, (plan, actual))| {
            (
                metric_id,
                MetricTotals {
                    plan: plan.round(),
                    actual: actual.round(),
                },
            )
        })
        .collect()
}

fn contribution(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
