mod common;

use axum::http::StatusCode;
use axum::http::HeaderValue;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use serde_json::{Value, json};

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let server = common::create_test_server();

    let response = server.get("/nowhere").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["details"], json!({"method": "GET", "path": "/nowhere"}));
}

#[tokio::test]
async fn test_method_mismatch_is_not_found() {
    let server = common::create_test_server();

    server
        .put("/posts")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = common::create_test_server();

    let response = server.post("/hello").text("{\"msg\": ").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_non_object_body_is_type_mismatch() {
    let server = common::create_test_server();

    let response = server.post("/hello").json(&json!(["world"])).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let details = &response.json::<Value>()["error"]["details"];
    assert_eq!(details["field"], "$");
    assert_eq!(details["reason"], "type-mismatch");
}

#[tokio::test]
async fn test_empty_body_counts_as_absent() {
    let server = common::create_test_server();

    let response = server.post("/hello").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"msg": "error"}));
}

#[tokio::test]
async fn test_unauthorized_carries_bearer_challenge() {
    let server = common::create_test_server();

    let response = server.get("/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header(WWW_AUTHENTICATE), "Bearer");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_ignored() {
    let server = common::create_test_server();
    let token = common::register(&server, "Alice", "alice@example.com").await;

    let response = server
        .get("/me")
        .add_header(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {token}")).unwrap(),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trailing_slash_matches() {
    let server = common::create_test_server();

    server.get("/foo/").await.assert_status_ok();
}

#[tokio::test]
async fn test_undeclared_body_fields_are_ignored() {
    let server = common::create_test_server();

    let response = server
        .post("/hello")
        .json(&json!({"msg": "world", "extra": true}))
        .await;

    assert_eq!(response.json::<Value>(), json!({"msg": "ok"}));
}
