use std::collections::HashMap;
use std::convert::TryFrom;

use chrono::NaiveDate;
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::report::{MetricTotals, PeriodSummary};

#[derive(Debug, Clone)]
pub struct SummarySnapshotRow {
    pub summary_id: String,
    pub owner_id: String,
    pub start_date: String,
    pub end_date: String,
    pub metrics_json: String,
    pub created_at: String,
}

impl SummarySnapshotRow {
    pub fn from_summary(
        summary_id: &str,
        summary: &PeriodSummary,
        created_at: &str,
    ) -> AppResult<Self> {
        Ok(Self {
            summary_id: summary_id.to_string(),
            owner_id: summary.owner_id.clone(),
            start_date: summary.start_date.to_string(),
            end_date: summary.end_date.to_string(),
            metrics_json: serde_json::to_string(&summary.metrics_summary)?,
            created_at: created_at.to_string(),
        })
    }

    pub fn into_summary(self) -> AppResult<PeriodSummary> {
        let metrics_summary: HashMap<String, MetricTotals> =
            serde_json::from_str(&self.metrics_json)?;

        Ok(PeriodSummary {
            owner_id: self.owner_id,
            start_date: parse_snapshot_date(&self.start_date)?,
            end_date: parse_snapshot_date(&self.end_date)?,
            metrics_summary,
        })
    }
}

fn parse_snapshot_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| AppError::database(format!("malformed snapshot date {value}: {err}")))
}

impl TryFrom<&Row<'_>> for SummarySnapshotRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            summary_id: row.get("summary_id")?,
            owner_id: row.get("owner_id")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            metrics_json: row.get("metrics_json")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct SummaryRepository;

impl SummaryRepository {
    pub fn upsert(conn: &Connection, row: &SummarySnapshotRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO period_summaries (
                    summary_id,
                    owner_id,
                    start_date,
                    end_date,
                    metrics_json,
                    created_at
                ) VALUES (
                    :summary_id,
                    :owner_id,
                    :start_date,
                    :end_date,
                    :metrics_json,
                    :created_at
                )
                ON CONFLICT(summary_id) DO UPDATE SET
                    owner_id = excluded.owner_id,
                    start_date = excluded.start_date,
                    end_date = excluded.end_date,
                    metrics_json = excluded.metrics_json,
                    created_at = excluded.created_at
            "#,
            named_params! {
                ":summary_id": &row.summary_id,
                ":owner_id": &row.owner_id,
                ":start_date": &row.start_date,
                ":end_date": &row.end_date,
                ":metrics_json": &row.metrics_json,
                ":created_at": &row.created_at,
            },
        )?;

        Ok(())
    }

    pub fn find_by_id(
        conn: &Connection,
        summary_id: &str,
    ) -> AppResult<Option<SummarySnapshotRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT
                summary_id,
                owner_id,
                start_date,
                end_date,
                metrics_json,
                created_at
            FROM period_summaries
            WHERE summary_id = ?1
        "#,
        )?;

        let row = stmt
            .query_row([summary_id], |row| SummarySnapshotRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn list_for_owner(
        conn: &Connection,
        owner_id: &str,
        limit: usize,
    ) -> AppResult<Vec<SummarySnapshotRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT
                summary_id,
                owner_id,
                start_date,
                end_date,
                metrics_json,
                created_at
            FROM period_summaries
            WHERE owner_id = ?1
            ORDER BY start_date DESC
            LIMIT ?2
        "#,
        )?;

        let rows = stmt
            .query_map(
                rusqlite::params![owner_id, limit as i64],
                |row| SummarySnapshotRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn delete_before(conn: &Connection, cutoff: &NaiveDate) -> AppResult<usize> {
        let deleted = conn.execute(
            "DELETE FROM period_summaries WHERE start_date < ?1",
            [cutoff.to_string()],
        )?;
        Ok(deleted)
    }
}
