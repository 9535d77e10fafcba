//! 认证 API 集成测试

use account_service::auth::jwt::JwtService;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::json;

mod common;
use common::{json_request, TestApp, TEST_SECRET};

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new();

    let (status, body) = app.register("alice", "correct-pw").await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["customer"]["username"], "alice");
    assert_eq!(body["customer"]["role"], "user");
    // first_name 默认等于用户名
    assert_eq!(body["customer"]["first_name"], "alice");
    assert!(body["customer"].get("password_hash").is_none());

    let (status, body) = app.login("alice", "correct-pw").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["customer"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new();
    app.register_ok("alice", "correct-pw").await;

    let (status, body) = app.login("alice", "wrong-pw").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["reason"], "invalid_credentials");
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let app = TestApp::new();
    app.register_ok("alice", "correct-pw").await;

    let (status_a, body_a) = app.login("alice", "wrong-pw").await;
    let (status_b, body_b) = app.login("nobody", "wrong-pw").await;

    assert_eq!(status_a, status_b);
    assert_eq!(body_a["error"]["reason"], body_b["error"]["reason"]);
    assert_eq!(body_a["error"]["message"], body_b["error"]["message"]);
}

#[tokio::test]
async fn test_register_duplicate_username_conflict() {
    let app = TestApp::new();
    app.register_ok("alice", "correct-pw").await;

    let (status, body) = app
        .post_json(
            "/api/v1/auth/register",
            json!({"username": "alice", "password": "another-pw", "email": "other@example.com"}),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["reason"], "conflict");
    assert_eq!(body["error"]["message"], "Username already exists");
}

#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let app = TestApp::new();
    app.register_ok("alice", "correct-pw").await;

    let (status, body) = app
        .post_json(
            "/api/v1/auth/register",
            json!({"username": "alice2", "password": "correct-pw", "email": "ALICE@example.com"}),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Email already exists");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/v1/auth/register", json!({"username": "alice"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["reason"], "validation_failed");

    let (status, _) = app
        .post_json(
            "/api/v1/auth/register",
            json!({"password": "correct-pw", "email": "a@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_weak_password_rejected() {
    let app = TestApp::new();

    let (status, body) = app.register("alice", "short").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["reason"], "validation_failed");
    assert!(app.login("alice", "short").await.0 == StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_ignores_role_in_body() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/v1/auth/register",
            json!({
                "username": "mallory",
                "password": "correct-pw",
                "email": "mallory@example.com",
                "role": "admin"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["customer"]["role"], "user");
}

#[tokio::test]
async fn test_login_malformed_json() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_missing_password() {
    let app = TestApp::new();

    let (status, _) = app
        .post_json("/api/v1/auth/login", json!({"username": "alice"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_route_without_header() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(Method::GET, "/api/v1/customers/profile", None, None))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["reason"], "missing_token");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let app = TestApp::new();

    let (status, body) = app.get_auth("/api/v1/customers/profile", "garbage").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["reason"], "invalid_token");
}

#[tokio::test]
async fn test_protected_route_with_wrong_scheme() {
    let app = TestApp::new();
    let (_, token) = app.register_ok("alice", "correct-pw").await;

    let (status, body) = app
        .send(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header(header::AUTHORIZATION, format!("Token {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["reason"], "missing_token");
}

#[tokio::test]
async fn test_expired_token_is_distinguishable() {
    let app = TestApp::new();
    let (customer_id, _) = app.register_ok("alice", "correct-pw").await;

    let jwt = JwtService::new(TEST_SECRET.as_bytes(), 3600).unwrap();
    let expired = jwt
        .issue_at(customer_id, "alice", Some("user"), Utc::now() - Duration::hours(2))
        .unwrap();

    let (status, body) = app.get_auth("/api/v1/auth/me", &expired.token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["reason"], "token_expired");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_invalid() {
    let app = TestApp::new();

    let other = JwtService::new(b"a-completely-different-secret-of-32-bytes", 3600).unwrap();
    let token = other.issue(1, "alice", Some("admin")).unwrap();

    let (status, body) = app.get_auth("/api/v1/auth/me", &token.token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["reason"], "invalid_token");
}

#[tokio::test]
async fn test_me_returns_claims() {
    let app = TestApp::new();
    let (customer_id, token) = app.register_ok("alice", "correct-pw").await;

    let (status, body) = app.get_auth("/api/v1/auth/me", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer_id"], customer_id);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_logout_is_stateless() {
    let app = TestApp::new();
    let (_, token) = app.register_ok("alice", "correct-pw").await;

    let (status, body) = app
        .send(json_request(Method::POST, "/api/v1/auth/logout", None, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    // 令牌不会被服务端撤销
    let (status, _) = app.get_auth("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_rate_limited() {
    let mut config = common::create_test_config();
    config.security.login_max_requests = 3;
    let app = TestApp::with_config(config);

    for _ in 0..3 {
        let (status, _) = app.login("nobody", "wrong-pw").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = app.login("nobody", "wrong-pw").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["reason"], "rate_limited");

    // 注册共享同一个窗口
    let (status, _) = app.register("alice", "correct-pw").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_response_carries_trace_headers() {
    let app = TestApp::new();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .uri("/health")
            .header("x-trace-id", "trace-abc")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-trace-id"], "trace-abc");
    assert!(response.headers().contains_key("x-request-id"));
}
