use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Validity horizon of a plan target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PlanPeriod {
    UntilWeekEnd,
    UntilMonthEnd,
}

impl PlanPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanPeriod::UntilWeekEnd => "untilWeekEnd",
            PlanPeriod::UntilMonthEnd => "untilMonthEnd",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Completed,
    Cancelled,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Completed => "completed",
            PlanStatus::Cancelled => "cancelled",
        }
    }
}

/// An owner's intended value for a metric over a stated period.
///
/// At most one *active* target per (metric, owner) is a design expectation
/// rather than a storage constraint; projection picks the first active match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTarget {
    pub metric_id: String,
    pub owner_id: String,
    pub target_value: f64,
    pub period: PlanPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PlanStatus,
}

impl PlanTarget {
    pub fn is_active(&self) -> bool {
        self.status == PlanStatus::Active
    }
}
