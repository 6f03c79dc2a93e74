use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::plan::PlanPeriod;

/// Display window for a report view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Day,
    Week,
    Month,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Day => "day",
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
        }
    }
}

/// Per-metric plan/actual totals over a window, rounded to whole numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTotals {
    pub plan: f64,
    pub actual: f64,
}

/// Derived summary of an owner's window. Recomputed on demand from daily
/// records; a persisted copy is a cached artifact, never a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub owner_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub metrics_summary: HashMap<String, MetricTotals>,
}

/// One metric row of a period report: aggregated totals plus, when an
/// active target is known, the projected end-of-period deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricReportEntry {
    pub plan: f64,
    pub actual: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_period: Option<PlanPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_deviation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub owner_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub metrics: HashMap<String, MetricReportEntry>,
    pub generated_at: String,
}

impl PeriodReport {
    /// Strip projection columns down to the plain derived summary.
    pub fn to_summary(&self) -> PeriodSummary {
        let metrics_summary = self
            .metrics
            .iter()
            .map(|(metric_id, entry)| {
                (
                    metric_id.clone(),
                    MetricTotals {
                        plan: entry.plan,
                        actual: entry.actual,
                    },
                )
            })
            .collect();

        PeriodSummary {
            owner_id: self.owner_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            metrics_summary,
        }
    }
}
