use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One metric cell of a daily entry. The hosted store may omit either side,
/// so both values are optional; an absent side contributes nothing to totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    #[serde(default)]
    pub plan: Option<f64>,
    #[serde(default)]
    pub actual: Option<f64>,
}

impl MetricValue {
    pub fn new(plan: f64, actual: f64) -> Self {
        Self {
            plan: Some(plan),
            actual: Some(actual),
        }
    }
}

/// A single owner/day entry. At most one record exists per (owner, date);
/// the hosted store upserts on that pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub owner_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub metric_values: HashMap<String, MetricValue>,
}

impl DailyRecord {
    pub fn new(owner_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            owner_id: owner_id.into(),
            date,
            metric_values: HashMap::new(),
        }
    }

    pub fn with_metric(mut self, metric_id: impl Into<String>, plan: f64, actual: f64) -> Self {
        self.metric_values
            .insert(metric_id.into(), MetricValue::new(plan, actual));
        self
    }
}
