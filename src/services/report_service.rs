use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::db::repositories::summary_repository::{SummaryRepository, SummarySnapshotRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::plan::PlanTarget;
use crate::models::record::DailyRecord;
use crate::models::report::{MetricReportEntry, PeriodReport, PeriodSummary};
use crate::services::aggregation::aggregate;
use crate::services::overlay::WriteOverlay;
use crate::services::period::WorkdayPolicy;
use crate::services::projection::project_with_policy;
use crate::services::report_cache::{ReportCache, ReportCacheKey};
use crate::store::{InFlightRegistry, RecordStore, StoreOperation};
use crate::utils::signature::report_signature;

/// Orchestrates the reporting flow: fetch records and targets from the
/// hosted store, aggregate, project, memoize. Also owns the optional
/// persisted "result report" snapshots, locally and on the hosted store.
///
/// Tentative UI writes are staged in the service's overlay; aggregation
/// only ever sees the authoritative snapshot plus confirmed writes.
pub struct ReportService {
    store: Arc<dyn RecordStore>,
    db: DbPool,
    cache: ReportCache,
    overlay: WriteOverlay,
    in_flight: InFlightRegistry,
    policy: WorkdayPolicy,
}

impl ReportService {
    pub fn new(store: Arc<dyn RecordStore>, db: DbPool) -> Self {
        Self::with_policy(store, db, WorkdayPolicy::default())
    }

    pub fn with_policy(store: Arc<dyn RecordStore>, db: DbPool, policy: WorkdayPolicy) -> Self {
        Self {
            store,
            db,
            cache: ReportCache::new(),
            overlay: WriteOverlay::new(),
            in_flight: InFlightRegistry::new(),
            policy,
        }
    }

    pub fn overlay(&self) -> &WriteOverlay {
        &self.overlay
    }

    /// Period report for an owner's window, served from the cache when the
    /// request signature matches a memoized result.
    pub async fn fetch_period_report(
        &self,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<PeriodReport> {
        if let Some(cached) = self.cache.lookup_request(owner_id, start_date, end_date) {
            debug!(target: "app::report", owner_id, "report cache hit");
            return Ok(cached);
        }

        self.load_period_report(owner_id, start_date, end_date).await
    }

    /// Bypass the cache, recompute, and repopulate. Observable results are
    /// identical to the cached path; only recomputation cost differs.
    pub async fn refresh_period_report(
        &self,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<PeriodReport> {
        debug!(target: "app::report", owner_id, "forced report refresh");
        self.load_period_report(owner_id, start_date, end_date).await
    }

    async fn load_period_report(
        &self,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<PeriodReport> {
        if start_date > end_date {
            warn!(
                target: "app::report",
                owner_id,
                from = %start_date,
                to = %end_date,
                "inverted report window, yielding empty report"
            );
        }

        // A failed fetch propagates here and never reaches the cache.
        let fetched = self
            .store
            .fetch_daily_records(owner_id, start_date, end_date)
            .await?;
        let targets = self.store.fetch_plan_targets(owner_id).await?;

        let records = self.overlay.confirmed(&fetched);
        let report = build_period_report(
            owner_id,
            start_date,
            end_date,
            &records,
            &targets,
            self.policy,
        );

        let key = ReportCacheKey::new(owner_id, start_date, end_date, records.len());
        self.cache.put(key, report.clone());

        Ok(report)
    }

    pub fn invalidate_owner(&self, owner_id: &str) {
        self.cache.invalidate_owner(owner_id);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Persist a derived summary locally as a "result report" snapshot.
    /// The snapshot is a cached artifact; reads always prefer recomputation.
    pub async fn save_result_report(&self, report: &PeriodReport) -> AppResult<String> {
        let summary = report.to_summary();
        let summary_id = report_signature(&summary.owner_id, summary.start_date, summary.end_date);
        let row =
            SummarySnapshotRow::from_summary(&summary_id, &summary, &Utc::now().to_rfc3339())?;

        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            db.with_connection(|conn| SummaryRepository::upsert(conn, &row))
        })
        .await
        .map_err(|err| AppError::other(format!("snapshot write task failed: {err}")))??;

        debug!(
            target: "app::report",
            summary_id = %summary_id,
            owner_id = %summary.owner_id,
            "result report snapshot saved"
        );

        Ok(summary_id)
    }

    pub async fn load_result_report(
        &self,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Option<PeriodSummary>> {
        let summary_id = report_signature(owner_id, start_date, end_date);

        let db = self.db.clone();
        let row = tokio::task::spawn_blocking(move || {
            db.with_connection(|conn| SummaryRepository::find_by_id(conn, &summary_id))
        })
        .await
        .map_err(|err| AppError::other(format!("snapshot read task failed: {err}")))??;

        row.map(|row| row.into_summary()).transpose()
    }

    /// Drop local snapshots whose window starts before the cutoff.
    pub async fn prune_result_reports(&self, cutoff: NaiveDate) -> AppResult<usize> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            db.with_connection(|conn| SummaryRepository::delete_before(conn, &cutoff))
        })
        .await
        .map_err(|err| AppError::other(format!("snapshot prune task failed: {err}")))?
    }

    /// Publish a derived summary to the hosted store for other surfaces.
    /// Duplicate submissions for the same summary are refused while the
    /// first is still in flight.
    pub async fn publish_result_report(&self, report: &PeriodReport) -> AppResult<PeriodSummary> {
        let summary = report.to_summary();
        let summary_id = report_signature(&summary.owner_id, summary.start_date, summary.end_date);

        if !self.in_flight.begin(StoreOperation::SaveSummary, &summary_id) {
            return Err(AppError::conflict(format!(
                "summary publish already in flight: {summary_id}"
            )));
        }

        let result = self.store.save_period_summary(&summary).await;
        self.in_flight.finish(StoreOperation::SaveSummary, &summary_id);
        result
    }

    pub async fn fetch_published_report(
        &self,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Option<PeriodSummary>> {
        let summary_id = report_signature(owner_id, start_date, end_date);
        self.store.fetch_period_summary(&summary_id).await
    }
}

/// Pure assembly of a period report from already-fetched data. The window's
/// end date is the projection reference: a report "as of" its last day.
pub fn build_period_report(
    owner_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    records: &[DailyRecord],
    targets: &[PlanTarget],
    policy: WorkdayPolicy,
) -> PeriodReport {
    let totals = aggregate(records, start_date, end_date);

    let mut metrics: HashMap<String, MetricReportEntry> = HashMap::with_capacity(totals.len());
    for (metric_id, total) in totals {
        let target = targets
            .iter()
            .find(|target| target.metric_id == metric_id && target.is_active());

        let projected_deviation = project_with_policy(
            target.map(|t| t.target_value),
            Some(total.actual),
            target.map(|t| t.period),
            end_date,
            policy,
        );

        metrics.insert(
            metric_id,
            MetricReportEntry {
                plan: total.plan,
                actual: total.actual,
                target_value: target.map(|t| t.target_value),
                plan_period: target.map(|t| t.period),
                projected_deviation,
            },
        );
    }

    PeriodReport {
        owner_id: owner_id.to_string(),
        start_date,
        end_date,
        metrics,
        generated_at: Utc::now().to_rfc3339(),
    }
}
