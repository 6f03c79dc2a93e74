use std::collections::HashMap;

use chrono::NaiveDate;
use httpmock::prelude::*;
use pulseboard_core::models::report::{MetricTotals, PeriodSummary};
use pulseboard_core::store::{HttpRecordStore, RecordStore, StoreConfig};
use pulseboard_core::utils::signature::report_signature;
use serde_json::json;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store_for(server: &MockServer) -> HttpRecordStore {
    HttpRecordStore::try_new(StoreConfig::new(server.base_url())).expect("record store")
}

#[tokio::test]
async fn daily_records_deserialize_from_the_wire_shape() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/owners/o1/records")
                .query_param("from", "2024-03-04")
                .query_param("to", "2024-03-08");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {
                        "ownerId": "o1",
                        "date": "2024-03-04",
                        "metricValues": {
                            "calls": {"plan": 30.0, "actual": 28.0},
                            // the store may omit one side of a cell
                            "revenue": {"actual": 1500.0}
                        }
                    },
                    {
                        "ownerId": "o1",
                        "date": "2024-03-05",
                        "metricValues": {}
                    }
                ]));
        })
        .await;

    let store = store_for(&server);
    let records = store
        .fetch_daily_records("o1", date(2024, 3, 4), date(2024, 3, 8))
        .await
        .expect("records");

    assert_eq!(records.len(), 2);
    let cell = records[0].metric_values.get("revenue").expect("revenue");
    assert_eq!(cell.plan, None);
    assert_eq!(cell.actual, Some(1500.0));
    assert!(records[1].metric_values.is_empty());
}

#[tokio::test]
async fn upstream_failures_carry_the_status_code() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/owners/o1/plan-targets");
            then.status(503).body("maintenance window");
        })
        .await;

    let store = store_for(&server);
    let error = store
        .fetch_plan_targets("o1")
        .await
        .expect_err("fetch fails");

    assert_eq!(error.upstream_status(), Some(503));
    assert!(error.to_string().contains("maintenance window"));
}

#[tokio::test]
async fn missing_published_summary_maps_to_none() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/api/v1/summaries/");
            then.status(404);
        })
        .await;

    let store = store_for(&server);
    let summary = store
        .fetch_period_summary("no-such-summary")
        .await
        .expect("summary fetch");
    assert!(summary.is_none());
}

#[tokio::test]
async fn publishing_a_summary_uses_its_signature_as_the_id() {
    let server = MockServer::start_async().await;

    let summary = PeriodSummary {
        owner_id: "o1".to_string(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 1, 7),
        metrics_summary: HashMap::from([(
            "m1".to_string(),
            MetricTotals {
                plan: 20.0,
                actual: 18.0,
            },
        )]),
    };
    let summary_id = report_signature("o1", date(2024, 1, 1), date(2024, 1, 7));

    let put_mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/api/v1/summaries/{summary_id}"))
                .json_body_partial(r#"{"ownerId": "o1"}"#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "ownerId": "o1",
                    "startDate": "2024-01-01",
                    "endDate": "2024-01-07",
                    "metricsSummary": {
                        "m1": {"plan": 20.0, "actual": 18.0}
                    }
                }));
        })
        .await;

    let store = store_for(&server);
    let saved = store
        .save_period_summary(&summary)
        .await
        .expect("publish summary");

    assert_eq!(saved, summary);
    assert_eq!(put_mock.hits_async().await, 1);
}

#[tokio::test]
async fn bearer_token_is_attached_when_configured() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/owners/o1/plan-targets")
                .header("authorization", "Bearer secret-key");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([]));
        })
        .await;

    let mut config = StoreConfig::new(server.base_url());
    config.api_key = Some("secret-key".to_string());
    let store = HttpRecordStore::try_new(config).expect("record store");

    let targets = store.fetch_plan_targets("o1").await.expect("targets");
    assert!(targets.is_empty());
}
