//! Tests for request execution, response processing and error normalization.

use std::sync::Arc;
use std::time::Duration;

use courier_core::{MappingMode, SerdeSchema, codes};
use courier_net::{ApiManager, HttpMethod, Notification, Parameters};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, PartialEq, Deserialize)]
struct Game {
    id: u64,
    white: String,
}

fn params(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn manager(server: &MockServer) -> ApiManager {
    ApiManager::builder(server.uri())
        .error_domain("com.example.api")
        .build()
        .expect("Failed to build manager")
}

fn record_notifications(api: &ApiManager) -> Arc<Mutex<Vec<Notification>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    api.notifications().subscribe(move |n| sink.lock().push(n));
    seen
}

#[tokio::test]
async fn test_get_sends_params_and_token_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games"))
        .and(query_param("page", "2"))
        .and(query_param("loginToken", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let api = manager(&server);
    api.set_login_token("tok");

    let payload = api
        .get("/games", &params(json!({"page": 2})))
        .await
        .expect("request failed");
    assert_eq!(payload.get("data"), Some(&json!([])));
}

#[tokio::test]
async fn test_post_sends_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/games/1/moves"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("move=e4"))
        .and(body_string_contains("loginToken=tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = manager(&server);
    api.set_login_token("tok");

    let payload = api
        .post("games/1/moves", &params(json!({"move": "e4"})))
        .await
        .expect("request failed");
    assert_eq!(payload.get("ok"), Some(&json!(true)));
}

#[tokio::test]
async fn test_delete_sends_params_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/games/1"))
        .and(query_param("reason", "abandoned"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let payload = manager(&server)
        .delete("/games/1", &params(json!({"reason": "abandoned"})))
        .await
        .expect("request failed");
    assert!(payload.is_empty());
}

#[tokio::test]
async fn test_error_fields_in_successful_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"error_code": 42, "error_message": "Invalid token"})),
        )
        .mount(&server)
        .await;

    let error = manager(&server)
        .get("/profile", &Parameters::new())
        .await
        .unwrap_err();

    assert_eq!(error.domain().as_str(), "com.example.api");
    assert_eq!(error.code(), 42);
    assert_eq!(error.message(), "Invalid token");
}

#[tokio::test]
async fn test_http_status_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>not here</html>"))
        .mount(&server)
        .await;

    let error = manager(&server)
        .get("/missing", &Parameters::new())
        .await
        .unwrap_err();

    assert_eq!(error.domain().as_str(), "com.example.api");
    assert_eq!(error.code(), 404);
    assert_eq!(error.message(), "Not Found");
}

#[tokio::test]
async fn test_server_error_wins_over_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/games"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error_code": "12", "error_message": "Opponent offline"})),
        )
        .mount(&server)
        .await;

    let error = manager(&server)
        .post("/games", &Parameters::new())
        .await
        .unwrap_err();

    assert_eq!(error.code(), 12);
    assert_eq!(error.message(), "Opponent offline");
}

#[tokio::test]
async fn test_undecodable_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let error = manager(&server)
        .get("/broken", &Parameters::new())
        .await
        .unwrap_err();
    assert_eq!(error.code(), codes::DECODE);
}

#[tokio::test]
async fn test_connection_failure() {
    let api = ApiManager::builder("http://127.0.0.1:1")
        .error_domain("com.example.api")
        .build()
        .expect("Failed to build manager");

    let error = api.get("/anything", &Parameters::new()).await.unwrap_err();
    assert_eq!(error.domain().as_str(), "com.example.api");
    assert!(error.code() < 0);
}

#[tokio::test]
async fn test_maintenance_notification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let api = manager(&server);
    let seen = record_notifications(&api);

    let error = api.get("/games", &Parameters::new()).await.unwrap_err();
    assert_eq!(error.code(), 503);
    assert_eq!(*seen.lock(), vec![Notification::Maintenance]);
}

#[tokio::test]
async fn test_version_expired_notification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games"))
        .respond_with(ResponseTemplate::new(426))
        .mount(&server)
        .await;

    let api = manager(&server);
    let seen = record_notifications(&api);

    let error = api.get("/games", &Parameters::new()).await.unwrap_err();
    assert_eq!(error.code(), 426);
    assert_eq!(*seen.lock(), vec![Notification::VersionExpired]);
}

#[tokio::test]
async fn test_ordinary_failure_posts_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = manager(&server);
    let seen = record_notifications(&api);

    api.get("/games", &Parameters::new()).await.unwrap_err();
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_fetch_entities_skips_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "white": "anna"},
                {"id": "broken"},
                {"id": 3, "white": "carl"}
            ]
        })))
        .mount(&server)
        .await;

    let games = manager(&server)
        .fetch_entities(
            "/games/live",
            HttpMethod::Get,
            &Parameters::new(),
            &SerdeSchema::<Game>::new(),
        )
        .await
        .expect("request failed");

    assert_eq!(
        games,
        vec![
            Game { id: 1, white: "anna".into() },
            Game { id: 3, white: "carl".into() },
        ]
    );
}

#[tokio::test]
async fn test_fetch_entities_single_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1, "white": "anna"}})),
        )
        .mount(&server)
        .await;

    let games = manager(&server)
        .fetch_entities("/games/1", HttpMethod::Get, &Parameters::new(), &SerdeSchema::<Game>::new())
        .await
        .expect("request failed");
    assert_eq!(games.len(), 1);
}

#[tokio::test]
async fn test_fetch_entities_strict_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "white": "anna"},
            {"white": "no id"}
        ])))
        .mount(&server)
        .await;

    let api = ApiManager::builder(server.uri())
        .mapping_mode(MappingMode::Strict)
        .build()
        .expect("Failed to build manager");

    let error = api
        .fetch_entities("/games/live", HttpMethod::Get, &Parameters::new(), &SerdeSchema::<Game>::new())
        .await
        .unwrap_err();

    assert_eq!(error.code(), codes::MALFORMED_ENTITY);
    assert!(error.message().contains("entry 1"));
}

#[derive(Debug, Deserialize)]
struct Announcement {
    #[serde(default)]
    title: Option<String>,
}

#[tokio::test]
async fn test_fetch_entities_null_envelope_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/announcements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null, "total": 0})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/announcements/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 0})))
        .mount(&server)
        .await;

    let api = manager(&server);
    let schema = SerdeSchema::<Announcement>::new();

    let none = api
        .fetch_entities("/announcements", HttpMethod::Get, &Parameters::new(), &schema)
        .await
        .expect("request failed");
    assert!(none.is_empty(), "unexpected entities: {none:?}");

    let scalar = api
        .fetch_entities("/announcements/count", HttpMethod::Get, &Parameters::new(), &schema)
        .await
        .expect("request failed");
    assert!(scalar.is_empty());

    assert!(none.iter().chain(&scalar).all(|a| a.title.is_none()));
}

#[tokio::test]
async fn test_client_settings_reach_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games"))
        .and(header("user-agent", "Chess/4.2"))
        .and(header("x-app-version", "4.2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiManager::builder(server.uri())
        .user_agent("Chess/4.2")
        .header("X-App-Version", "4.2.0")
        .build()
        .expect("Failed to build manager");

    api.get("/games", &Parameters::new())
        .await
        .expect("request failed");
}

#[tokio::test]
async fn test_invalid_header_fails_build() {
    let result = ApiManager::builder("https://api.example.com")
        .header("not a header", "x")
        .build();
    assert!(matches!(result, Err(courier_net::NetworkError::InvalidHeader(_))));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let api = ApiManager::builder(server.uri())
        .error_domain("com.example.api")
        .timeout(Duration::from_millis(100))
        .build()
        .expect("Failed to build manager");

    let error = api.get("/slow", &Parameters::new()).await.unwrap_err();
    assert_eq!(error.code(), codes::TIMEOUT);
    assert_eq!(error.domain().as_str(), "com.example.api");
}
