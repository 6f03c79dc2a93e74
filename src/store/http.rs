use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::plan::PlanTarget;
use crate::models::record::DailyRecord;
use crate::models::report::PeriodSummary;
use crate::store::RecordStore;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub http_timeout: StdDuration,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            http_timeout: StdDuration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Self {
        let base_url = std::env::var("PULSEBOARD_STORE_URL")
            .ok()
            .unwrap_or_else(|| "http://localhost:8090".to_string());
        let api_key = std::env::var("PULSEBOARD_STORE_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Self {
            base_url,
            api_key,
            http_timeout: StdDuration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// HTTP client for the hosted datastore's REST API.
///
/// The client maps transport and non-success statuses to upstream errors
/// and never retries; retry policy belongs to the surrounding I/O layer.
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRecordStore {
    pub fn try_new(config: StoreConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("failed to build store HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn expect_success(
        response: reqwest::Response,
        correlation_id: &str,
    ) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(
            target: "app::store",
            correlation_id = %correlation_id,
            status = status.as_u16(),
            "store request failed"
        );
        Err(AppError::upstream(
            Some(status.as_u16()),
            if body.is_empty() {
                format!("store responded with status {}", status.as_u16())
            } else {
                format!("store responded with status {}: {body}", status.as_u16())
            },
        ))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_daily_records(
        &self,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Vec<DailyRecord>> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}/api/v1/owners/{owner_id}/records", self.base_url);

        debug!(
            target: "app::store",
            correlation_id = %correlation_id,
            owner_id,
            from = %start_date,
            to = %end_date,
            "fetching daily records"
        );

        let response = self
            .request(self.client.get(&url))
            .query(&[
                ("from", start_date.to_string()),
                ("to", end_date.to_string()),
            ])
            .send()
            .await?;

        let response = Self::expect_success(response, &correlation_id).await?;
        let records: Vec<DailyRecord> = response.json().await?;

        debug!(
            target: "app::store",
            correlation_id = %correlation_id,
            count = records.len(),
            "daily records fetched"
        );

        Ok(records)
    }

    async fn fetch_plan_targets(&self, owner_id: &str) -> AppResult<Vec<PlanTarget>> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}/api/v1/owners/{owner_id}/plan-targets", self.base_url);

        debug!(
            target: "app::store",
            correlation_id = %correlation_id,
            owner_id,
            "fetching plan targets"
        );

        let response = self.request(self.client.get(&url)).send().await?;
        let response = Self::expect_success(response, &correlation_id).await?;
        let targets: Vec<PlanTarget> = response.json().await?;

        Ok(targets)
    }

    async fn fetch_period_summary(&self, summary_id: &str) -> AppResult<Option<PeriodSummary>> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}/api/v1/summaries/{summary_id}", self.base_url);

        let response = self.request(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(
                target: "app::store",
                correlation_id = %correlation_id,
                summary_id,
                "period summary not published"
            );
            return Ok(None);
        }

        let response = Self::expect_success(response, &correlation_id).await?;
        let summary: PeriodSummary = response.json().await?;
        Ok(Some(summary))
    }

    async fn save_period_summary(&self, summary: &PeriodSummary) -> AppResult<PeriodSummary> {
        let correlation_id = Uuid::new_v4().to_string();
        let summary_id = crate::utils::signature::report_signature(
            &summary.owner_id,
            summary.start_date,
            summary.end_date,
        );
        let url = format!("{}/api/v1/summaries/{summary_id}", self.base_url);

        debug!(
            target: "app::store",
            correlation_id = %correlation_id,
            summary_id = %summary_id,
            owner_id = %summary.owner_id,
            "publishing period summary"
        );

        let response = self
            .request(self.client.put(&url))
            .json(summary)
            .send()
            .await?;

        let response = Self::expect_success(response, &correlation_id).await?;
        let saved: PeriodSummary = response.json().await?;
        Ok(saved)
    }
}
