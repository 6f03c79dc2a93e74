use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::models::plan::PlanTarget;
use crate::models::record::DailyRecord;
use crate::models::report::PeriodSummary;

pub mod dedup;
pub mod http;

pub use dedup::{InFlightRegistry, StoreOperation};
pub use http::{HttpRecordStore, StoreConfig};

/// Data-access contract of the hosted datastore. Calls return the current
/// snapshot of matching rows with no transactional guarantee across calls;
/// failures propagate unchanged to the caller.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_daily_records(
        &self,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Vec<DailyRecord>>;

    async fn fetch_plan_targets(&self, owner_id: &str) -> AppResult<Vec<PlanTarget>>;

    async fn fetch_period_summary(&self, summary_id: &str) -> AppResult<Option<PeriodSummary>>;

    async fn save_period_summary(&self, summary: &PeriodSummary) -> AppResult<PeriodSummary>;
}
