//! Search API client and search polling against a mock server

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use justice_sync::config::ApiConfig;
use justice_sync::search::{poll_searches, HttpSearchApi, SearchApi, SearchStatus, SearchWatch};

use common::agent_config;

fn api(server: &MockServer, token: Option<&str>) -> HttpSearchApi {
    let config = ApiConfig {
        base_url: format!("{}/api", server.uri()),
        token: token.map(str::to_string),
    };
    HttpSearchApi::new(&config, &agent_config(&server.uri())).expect("failed to build client")
}

#[tokio::test]
async fn test_list_searches_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/searches"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "s-1",
                "document": "12345678900",
                "created_at": "2024-03-01T10:00:00Z",
                "status": "PROCESSING",
                "progress": 40.0,
                "result_count": 3,
                "current_phase": "COLLECTING_DETAILS",
                "total_detail_jobs": 10,
                "completed_detail_jobs": 4
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = api(&server, Some("secret")).list_searches().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, SearchStatus::Processing);
    assert_eq!(jobs[0].phase_message(), "Processando detalhes (4/10)");
}

#[tokio::test]
async fn test_list_searches_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/searches"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid token"})))
        .mount(&server)
        .await;

    let err = api(&server, None).list_searches().await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid token");
}

#[tokio::test]
async fn test_settled_searches_are_not_polled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/searches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "s-1", "status": "COMPLETED"},
            {"id": "s-2", "status": "FAILED"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let watch = poll_searches(Arc::new(api(&server, None)), Duration::from_millis(5))
        .await
        .unwrap();
    match watch {
        SearchWatch::Settled(jobs) => assert_eq!(jobs.len(), 2),
        SearchWatch::Polling { .. } => panic!("settled searches should not be polled"),
    }
}

#[tokio::test]
async fn test_polling_stops_once_searches_settle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/searches"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "s-1", "status": "PROCESSING", "progress": 50.0}])),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/searches"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "s-1", "status": "COMPLETED", "progress": 100.0}])),
        )
        .mount(&server)
        .await;

    let watch = poll_searches(Arc::new(api(&server, None)), Duration::from_millis(5))
        .await
        .unwrap();
    let SearchWatch::Polling {
        initial,
        mut updates,
    } = watch
    else {
        panic!("expected polling to start");
    };
    assert_eq!(initial[0].status, SearchStatus::Processing);

    let mut last = None;
    while let Some(jobs) = tokio::time::timeout(Duration::from_secs(5), updates.next())
        .await
        .expect("polling did not settle")
    {
        last = Some(jobs);
    }
    assert_eq!(last.unwrap()[0].status, SearchStatus::Completed);
}
