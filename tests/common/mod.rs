#![allow(dead_code)]

use axum_test::TestServer;
use forum_gate::auth::{PasswordHasher, TokenService};
use forum_gate::forum;
use forum_gate::transport;
use serde_json::{Value, json};
use std::sync::Arc;

pub const SECRET: &str = "integration-test-secret";

/// A server over a fresh, empty forum.
pub fn create_test_server() -> TestServer {
    let router = forum::dispatcher(
        TokenService::new(SECRET, 3600),
        PasswordHasher::new("test-pepper"),
    )
    .unwrap();

    TestServer::new(transport::routes(Arc::new(router))).unwrap()
}

pub fn user_payload(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "email": email,
        "phone": "010-1234-5678",
        "password": "correct horse",
        "age": 30
    })
}

/// Registers a user and returns their access token.
pub async fn register(server: &TestServer, username: &str, email: &str) -> String {
    let response = server
        .post("/register")
        .json(&user_payload(username, email))
        .await;
    response.assert_status_ok();

    response.json::<Value>()["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Creates a post and returns its id.
pub async fn create_post(server: &TestServer, token: &str, content: &str) -> String {
    let response = server
        .post("/posts")
        .authorization_bearer(token)
        .json(&json!({ "content": content }))
        .await;
    response.assert_status_ok();

    response.json::<Value>()["postId"]
        .as_str()
        .unwrap()
        .to_string()
}
