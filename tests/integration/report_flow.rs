use std::sync::Arc;

use chrono::NaiveDate;
use httpmock::prelude::*;
use pulseboard_core::db::DbPool;
use pulseboard_core::models::record::DailyRecord;
use pulseboard_core::services::report_service::ReportService;
use pulseboard_core::store::{HttpRecordStore, StoreConfig};
use pulseboard_core::utils::signature::report_signature;
use serde_json::json;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn records_body() -> serde_json::Value {
    json!([
        {
            "ownerId": "o1",
            "date": "2024-01-01",
            "metricValues": {
                "m1": {"plan": 10.0, "actual": 8.0}
            }
        },
        {
            "ownerId": "o1",
            "date": "2024-01-02",
            "metricValues": {
                "m1": {"plan": 10.0, "actual": 12.0}
            }
        }
    ])
}

fn targets_body() -> serde_json::Value {
    json!([
        {
            "metricId": "m1",
            "ownerId": "o1",
            "targetValue": 100.0,
            "period": "untilWeekEnd",
            "startDate": "2024-01-01",
            "endDate": "2024-01-07",
            "status": "active"
        }
    ])
}

#[tokio::test]
async fn report_flow_aggregates_projects_and_memoizes() {
    let server = MockServer::start_async().await;

    let records_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/owners/o1/records")
                .query_param("from", "2024-01-01")
                .query_param("to", "2024-01-02");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(records_body());
        })
        .await;

    let targets_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/plan-targets");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(targets_body());
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("reports.sqlite")).expect("db pool");
    let store =
        HttpRecordStore::try_new(StoreConfig::new(server.base_url())).expect("record store");
    let service = ReportService::new(Arc::new(store), pool);

    let start = date(2024, 1, 1);
    let end = date(2024, 1, 2);

    let report = service
        .fetch_period_report("o1", start, end)
        .await
        .expect("period report");

    let m1 = report.metrics.get("m1").expect("m1 entry");
    assert_eq!(m1.plan, 20.0);
    assert_eq!(m1.actual, 20.0);
    assert_eq!(m1.target_value, Some(100.0));
    // 2024-01-02 is a Tuesday: 2 of 5 working days passed, daily average 10,
    // projected final 50 against a 100 target
    assert_eq!(m1.projected_deviation, Some(-50.0));

    // identical request signature is served from the cache
    let cached = service
        .fetch_period_report("o1", start, end)
        .await
        .expect("cached report");
    assert_eq!(cached.metrics, report.metrics);
    assert_eq!(records_mock.hits_async().await, 1);
    assert_eq!(targets_mock.hits_async().await, 1);

    // forced refresh bypasses and repopulates the cache
    let refreshed = service
        .refresh_period_report("o1", start, end)
        .await
        .expect("refreshed report");
    assert_eq!(refreshed.metrics, report.metrics);
    assert_eq!(records_mock.hits_async().await, 2);

    // invalidation forces the next plain fetch back to the store
    service.invalidate_owner("o1");
    service
        .fetch_period_report("o1", start, end)
        .await
        .expect("report after invalidation");
    assert_eq!(records_mock.hits_async().await, 3);
}

#[tokio::test]
async fn result_report_snapshots_round_trip_locally() {
    let server = MockServer::start_async().await;

    let _records_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/records");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(records_body());
        })
        .await;

    let _targets_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/plan-targets");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(targets_body());
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("reports.sqlite")).expect("db pool");
    let store =
        HttpRecordStore::try_new(StoreConfig::new(server.base_url())).expect("record store");
    let service = ReportService::new(Arc::new(store), pool);

    let start = date(2024, 1, 1);
    let end = date(2024, 1, 2);

    let report = service
        .fetch_period_report("o1", start, end)
        .await
        .expect("period report");

    let summary_id = service
        .save_result_report(&report)
        .await
        .expect("save snapshot");
    assert!(!summary_id.is_empty());

    let loaded = service
        .load_result_report("o1", start, end)
        .await
        .expect("load snapshot")
        .expect("snapshot present");
    assert_eq!(loaded, report.to_summary());

    // unknown windows load nothing
    assert!(service
        .load_result_report("o1", date(2024, 2, 1), date(2024, 2, 2))
        .await
        .expect("load missing")
        .is_none());

    // retention prunes snapshots whose window starts before the cutoff
    let pruned = service
        .prune_result_reports(date(2024, 6, 1))
        .await
        .expect("prune snapshots");
    assert_eq!(pruned, 1);
    assert!(service
        .load_result_report("o1", start, end)
        .await
        .expect("load after prune")
        .is_none());
}

#[tokio::test]
async fn published_reports_round_trip_through_the_hosted_store() {
    let server = MockServer::start_async().await;

    let _records_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/records");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(records_body());
        })
        .await;

    let _targets_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/plan-targets");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(targets_body());
        })
        .await;

    let summary_id = report_signature("o1", date(2024, 1, 1), date(2024, 1, 2));
    let summary_body = json!({
        "ownerId": "o1",
        "startDate": "2024-01-01",
        "endDate": "2024-01-02",
        "metricsSummary": {
            "m1": {"plan": 20.0, "actual": 20.0}
        }
    });

    let put_mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/api/v1/summaries/{summary_id}"));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(summary_body.clone());
        })
        .await;

    let _get_summary_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/api/v1/summaries/{summary_id}"));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(summary_body.clone());
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("reports.sqlite")).expect("db pool");
    let store =
        HttpRecordStore::try_new(StoreConfig::new(server.base_url())).expect("record store");
    let service = ReportService::new(Arc::new(store), pool);

    let start = date(2024, 1, 1);
    let end = date(2024, 1, 2);

    let report = service
        .fetch_period_report("o1", start, end)
        .await
        .expect("period report");

    let published = service
        .publish_result_report(&report)
        .await
        .expect("publish summary");
    assert_eq!(published, report.to_summary());
    assert_eq!(put_mock.hits_async().await, 1);

    let fetched = service
        .fetch_published_report("o1", start, end)
        .await
        .expect("fetch published summary");
    assert_eq!(fetched, Some(published));
}

#[tokio::test]
async fn confirmed_overlay_writes_flow_into_reports() {
    let server = MockServer::start_async().await;

    let _records_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/records");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {
                        "ownerId": "o1",
                        "date": "2024-01-01",
                        "metricValues": {
                            "m1": {"plan": 10.0, "actual": 8.0}
                        }
                    }
                ]));
        })
        .await;

    let _targets_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/plan-targets");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([]));
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("reports.sqlite")).expect("db pool");
    let store =
        HttpRecordStore::try_new(StoreConfig::new(server.base_url())).expect("record store");
    let service = ReportService::new(Arc::new(store), pool);

    let start = date(2024, 1, 1);
    let end = date(2024, 1, 2);

    let staged =
        DailyRecord::new("o1", date(2024, 1, 2)).with_metric("m1", 10.0, 12.0);
    let write_id = service.overlay().stage(staged);

    // pending writes are invisible to aggregation
    let report = service
        .fetch_period_report("o1", start, end)
        .await
        .expect("period report");
    let m1 = report.metrics.get("m1").expect("m1 entry");
    assert_eq!(m1.plan, 10.0);
    assert_eq!(m1.actual, 8.0);

    service.overlay().confirm(&write_id);

    let refreshed = service
        .refresh_period_report("o1", start, end)
        .await
        .expect("refreshed report");
    let m1 = refreshed.metrics.get("m1").expect("m1 entry");
    assert_eq!(m1.plan, 20.0);
    assert_eq!(m1.actual, 20.0);
}

#[tokio::test]
async fn failed_fetch_for_one_owner_leaves_other_keys_cached() {
    let server = MockServer::start_async().await;

    let o1_records = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/records");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(records_body());
        })
        .await;

    let _o1_targets = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/plan-targets");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(targets_body());
        })
        .await;

    let _o2_records = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o2/records");
            then.status(500)
                .header("content-type", "application/json")
                .json_body(json!({"error": "storage unavailable"}));
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("reports.sqlite")).expect("db pool");
    let store =
        HttpRecordStore::try_new(StoreConfig::new(server.base_url())).expect("record store");
    let service = ReportService::new(Arc::new(store), pool);

    let start = date(2024, 1, 1);
    let end = date(2024, 1, 2);

    service
        .fetch_period_report("o1", start, end)
        .await
        .expect("o1 report");

    let error = service
        .fetch_period_report("o2", start, end)
        .await
        .expect_err("o2 fetch fails");
    assert_eq!(error.upstream_status(), Some(500));

    // o1 stays cached: no extra store traffic
    service
        .fetch_period_report("o1", start, end)
        .await
        .expect("o1 cached report");
    assert_eq!(o1_records.hits_async().await, 1);

    // the failure was never stored as a successful entry
    let error = service
        .fetch_period_report("o2", start, end)
        .await
        .expect_err("o2 still fails");
    assert_eq!(error.upstream_status(), Some(500));
}
