//! Tests for batch execution.

use courier_core::codes;
use courier_net::{ApiManager, BatchRequest, HttpMethod, Parameters};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn params(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn requests() -> Vec<BatchRequest> {
    vec![
        BatchRequest::new(HttpMethod::Get, "/games/1"),
        BatchRequest::new(HttpMethod::Post, "/games/1/moves").with_body(params(json!({"move": "e4"}))),
        BatchRequest::new(HttpMethod::Get, "/players/anna"),
    ]
}

#[tokio::test]
async fn test_batch_outcomes_follow_request_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .and(body_json(json!({
            "season": "2024",
            "loginToken": "tok",
            "requests": [
                {"method": "GET", "url": "/games/1", "body": null},
                {"method": "POST", "url": "/games/1/moves", "body": {"move": "e4"}},
                {"method": "GET", "url": "/players/anna", "body": null}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"body": {"data": {"id": 1}}},
                {"error_code": 7, "error_message": "Illegal move"},
                {"body": {"data": {"name": "anna"}}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiManager::builder(server.uri())
        .error_domain("com.example.api")
        .login_token("tok")
        .build()
        .expect("Failed to build manager");

    let outcomes = api
        .execute_batch(&params(json!({"season": "2024"})), &requests())
        .await
        .expect("batch failed");

    assert_eq!(outcomes.len(), 3);

    let first = outcomes[0].as_ref().expect("first entry failed");
    assert_eq!(first.get("data"), Some(&json!({"id": 1})));

    let second = outcomes[1].as_ref().unwrap_err();
    assert_eq!(second.code(), 7);
    assert_eq!(second.message(), "Illegal move");
    assert_eq!(second.domain().as_str(), "com.example.api");

    let third = outcomes[2].as_ref().expect("third entry failed");
    assert_eq!(third.get("data"), Some(&json!({"name": "anna"})));
}

#[tokio::test]
async fn test_batch_length_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"body": {}}])))
        .mount(&server)
        .await;

    let api = ApiManager::builder(server.uri())
        .build()
        .expect("Failed to build manager");

    let error = api
        .execute_batch(&Parameters::new(), &requests())
        .await
        .unwrap_err();
    assert_eq!(error.code(), codes::BATCH_MISMATCH);
}

#[tokio::test]
async fn test_batch_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/multi"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = ApiManager::builder(server.uri())
        .batch_path("/api/multi")
        .build()
        .expect("Failed to build manager");

    let error = api
        .execute_batch(&Parameters::new(), &requests())
        .await
        .unwrap_err();
    assert_eq!(error.code(), 500);
}

#[tokio::test]
async fn test_bodiless_batch_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/batch"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let api = ApiManager::builder(server.uri())
        .build()
        .expect("Failed to build manager");

    let error = api
        .execute_batch(&Parameters::new(), &requests())
        .await
        .unwrap_err();
    assert_eq!(error.code(), codes::BATCH_MISMATCH);
    assert!(error.message().contains("received 0"), "{}", error.message());
}
