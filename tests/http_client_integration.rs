//! Justice Agent HTTP client against a mock server

mod common;

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use justice_sync::error::JusticeSyncError;
use justice_sync::remote::{HttpSessionService, SessionService};

use common::{agent_config, closed_port_url};

async fn service(server: &MockServer) -> HttpSessionService {
    HttpSessionService::new(&agent_config(&server.uri())).expect("failed to build client")
}

fn remote_status(error: &anyhow::Error) -> (u16, String) {
    match error.downcast_ref::<JusticeSyncError>() {
        Some(JusticeSyncError::RemoteStatus { status, message }) => (*status, message.clone()),
        other => panic!("expected RemoteStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_health_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    service(&server).await.health().await.unwrap();
}

#[tokio::test]
async fn test_health_unreachable() {
    let service = HttpSessionService::new(&agent_config(&closed_port_url())).unwrap();
    let err = service.health().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JusticeSyncError>(),
        Some(JusticeSyncError::Remote(_))
    ));
}

#[tokio::test]
async fn test_create_session_posts_user_and_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .and(body_json(json!({"user_id": "user-demo", "session_name": "Processo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "srv-1",
            "user_id": "user-demo",
            "session_name": "Processo",
            "created_at": "2024-03-01T10:00:00Z",
            "message_count": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let descriptor = service(&server)
        .await
        .create_session("user-demo", Some("Processo"))
        .await
        .unwrap();
    assert_eq!(descriptor.session_id, "srv-1");
    assert_eq!(descriptor.session_name.as_deref(), Some("Processo"));
}

#[tokio::test]
async fn test_list_sessions_sends_user_id_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions"))
        .and(query_param("user_id", "user demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [
                {"session_id": "srv-1", "user_id": "user demo", "created_at": 1709287200},
                {"session_id": "srv-2", "user_id": "user demo"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sessions = service(&server)
        .await
        .list_sessions("user demo")
        .await
        .unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].created_at, Some(json!(1709287200)));
    assert_eq!(sessions[1].message_count, 0);
}

#[tokio::test]
async fn test_get_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/srv-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "srv-1",
            "messages": [
                {"role": "user", "content": "Olá", "timestamp": 1709287200},
                {"role": "assistant", "content": "Oi!", "timestamp": "2024-03-01T10:01:00Z"}
            ],
            "message_count": 2
        })))
        .mount(&server)
        .await;

    let history = service(&server).await.get_history("srv-1").await.unwrap();
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[1].content, "Oi!");
}

#[tokio::test]
async fn test_delete_session_returns_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/sessions/srv-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Session deleted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let message = service(&server)
        .await
        .delete_session("srv-1")
        .await
        .unwrap();
    assert_eq!(message, "Session deleted");
}

#[tokio::test]
async fn test_run_is_not_streamed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/run"))
        .and(body_json(json!({
            "message": "Olá",
            "stream": false,
            "session_id": "srv-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Como posso ajudar?",
            "session_id": "srv-1",
            "agent": "justice"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = service(&server)
        .await
        .run("Olá", Some("srv-1"))
        .await
        .unwrap();
    assert_eq!(response.message, "Como posso ajudar?");
    assert_eq!(response.session_id.as_deref(), Some("srv-1"));
}

#[tokio::test]
async fn test_list_models_returns_raw_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"models": ["gpt-4o-mini"]})),
        )
        .mount(&server)
        .await;

    let models = service(&server).await.list_models().await.unwrap();
    assert_eq!(models["models"][0], "gpt-4o-mini");
}

#[tokio::test]
async fn test_error_body_message_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/run"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"error": "Agent is warming up"})),
        )
        .mount(&server)
        .await;

    let err = service(&server).await.run("Olá", None).await.unwrap_err();
    assert_eq!(remote_status(&err), (503, "Agent is warming up".to_string()));
}

#[tokio::test]
async fn test_detail_body_message_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Session not found"})),
        )
        .mount(&server)
        .await;

    let err = service(&server)
        .await
        .get_history("missing")
        .await
        .unwrap_err();
    assert_eq!(remote_status(&err), (404, "Session not found".to_string()));
}

#[tokio::test]
async fn test_json_without_message_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/sessions/srv-1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"ok": false})))
        .mount(&server)
        .await;

    let err = service(&server)
        .await
        .delete_session("srv-1")
        .await
        .unwrap_err();
    assert_eq!(
        remote_status(&err),
        (500, "Request failed with status 500".to_string())
    );
}

#[tokio::test]
async fn test_non_json_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = service(&server).await.health().await.unwrap_err();
    assert_eq!(remote_status(&err), (502, "Unknown error occurred".to_string()));
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agent/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = agent_config(&format!("{}/agent/", server.uri()));
    let service = HttpSessionService::new(&config).unwrap();
    service.health().await.unwrap();
}
