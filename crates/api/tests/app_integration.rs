//! Integration tests for routing, authentication and middleware.
//!
//! These run against the full router with a lazily connecting pool, so
//! they cover everything that resolves before a database round trip.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;
use uuid::Uuid;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn bearer_token(role: &str) -> String {
    let jwt = shared::jwt::JwtConfig::new("integration-test-secret", 3600);
    jwt.generate_token(Uuid::new_v4(), "tester@example.com", role)
        .expect("token")
}

#[tokio::test]
async fn liveness_probe_is_public() {
    let app = common::test_app();
    let response = app.oneshot(get("/api/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let app = common::test_app();
    let response = app.oneshot(get("/api/health/live")).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn incoming_request_id_is_echoed() {
    let app = common::test_app();
    let request = Request::builder()
        .uri("/api/health/live")
        .header("X-Request-ID", "test-request-42")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-request-42"
    );
}

#[tokio::test]
async fn metrics_endpoint_is_public() {
    let app = common::test_app();
    let response = app.oneshot(get("/metrics")).await.unwrap();
    // 200 when the recorder is installed, 500 otherwise; never auth-gated
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_listing_requires_session() {
    let app = common::test_app();
    let response = app.oneshot(get("/api/surveys")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() {
    let app = common::test_app();
    let request = Request::builder()
        .uri("/api/templates")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let jwt = shared::jwt::JwtConfig::new("some-other-secret", 3600);
    let token = jwt
        .generate_token(Uuid::new_v4(), "tester@example.com", "ADMIN")
        .unwrap();

    let app = common::test_app();
    let request = Request::builder()
        .uri("/api/settings")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_management_requires_admin_role() {
    let app = common::test_app();
    let request = Request::builder()
        .uri("/api/users")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", bearer_token("USER")),
        )
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn template_management_requires_admin_role() {
    let app = common::test_app();
    let request = Request::builder()
        .uri("/api/templates")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", bearer_token("USER")),
        )
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn trigger_requires_session_or_api_key() {
    let app = common::test_app();
    let response = app
        .oneshot(post_json("/api/surveys", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_api_key_is_rejected_without_lookup() {
    let app = common::test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/surveys")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-API-Key", "bad")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_validates_email_before_lookup() {
    let app = common::test_app();
    let response = app
        .oneshot(post_json(
            "/api/auth/login",
            r#"{"email":"not-an-email","password":"secret123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = common::test_app();
    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
