mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_forgot_password_passthrough() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/forgot-password"))
        .and(body_json(json!({ "email": "ada@example.com" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = TestApp::delegated(&upstream.uri()).await;
    let res = app
        .post_json("/forgot-password", &json!({ "email": "ada@example.com" }), None)
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_forgot_password_mirrors_upstream_status() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/forgot-password"))
        .respond_with(ResponseTemplate::new(404).set_body_string("User not found"))
        .mount(&upstream)
        .await;

    let app = TestApp::delegated(&upstream.uri()).await;
    let res = app
        .post_json("/forgot-password", &json!({ "email": "ghost@example.com" }), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, json!({ "error": "User not found" }));
}

#[tokio::test]
async fn test_reset_password_is_validated_locally_first() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/reset-password"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = TestApp::local_with_upstream(&upstream.uri()).await;

    let short = app
        .post_json(
            "/reset-password",
            &json!({ "token": "t0k3n", "password": "short" }),
            None,
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        short.body,
        json!({ "error": "Password must be at least 10 characters" })
    );

    let mismatch = app
        .post_json(
            "/reset-password",
            &json!({ "token": "t0k3n", "password": "long-enough-1", "confirm_password": "long-enough-2" }),
            None,
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.body, json!({ "error": "Passwords do not match" }));

    let unconfirmed = app
        .post_json(
            "/reset-password",
            &json!({ "token": "t0k3n", "password": "long-enough-1" }),
            None,
        )
        .await;
    assert_eq!(unconfirmed.status, StatusCode::BAD_REQUEST);
    assert_eq!(unconfirmed.body, json!({ "error": "Passwords do not match" }));
}

#[tokio::test]
async fn test_reset_password_forwards_new_password() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/reset-password"))
        .and(body_json(json!({ "token": "t0k3n", "new_password": "long-enough-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = TestApp::local_with_upstream(&upstream.uri()).await;
    let res = app
        .post_json(
            "/reset-password",
            &json!({ "token": "t0k3n", "password": "long-enough-1", "confirm_password": "long-enough-1" }),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_reset_password_upstream_detail() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/reset-password"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Invalid or expired token" })),
        )
        .mount(&upstream)
        .await;

    let app = TestApp::local_with_upstream(&upstream.uri()).await;
    let res = app
        .post_json(
            "/reset-password",
            &json!({ "token": "old", "password": "long-enough-1", "confirm_password": "long-enough-1" }),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "error": "Invalid or expired token" }));
}
