mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{TestApp, TEST_SECRET};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;
use work_order_tracker::domain::models::{auth::Claims, role::Role};

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_login_token_carries_stored_role() {
    let app = TestApp::new().await;
    let manager_id = app.seed_user("admin", "admin", Role::Manager).await;

    let token = app.login("admin", "admin").await;
    let decoded = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(TEST_SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    ).unwrap();

    assert_eq!(decoded.claims.user_id, manager_id);
    assert_eq!(decoded.claims.username, "admin");
    assert_eq!(decoded.claims.role, Role::Manager);
    assert!(decoded.claims.exp > decoded.claims.iat);
}

#[tokio::test]
async fn test_login_failures_are_distinct() {
    let app = TestApp::new().await;
    app.seed_user("operator1", "password1", Role::Operator).await;

    let (status, body) = app.request("POST", "/auth/login", None, Some(json!({
        "username": "nobody-here", "password": "password1"
    }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found.");

    let (status, body) = app.request("POST", "/auth/login", None, Some(json!({
        "username": "operator1", "password": "wrong-password"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid password.");

    let (status, body) = app.request("POST", "/auth/login", None, Some(json!({
        "username": "op", "password": "short"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_register_creates_operator_and_rejects_duplicates() {
    let app = TestApp::new().await;

    let (status, body) = app.request("POST", "/auth/register", None, Some(json!({
        "username": "newcomer", "password": "password1"
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["username"], "newcomer");
    assert_eq!(body["user"]["role"], "OPERATOR");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app.request("POST", "/auth/register", None, Some(json!({
        "username": "newcomer", "password": "another1"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already exists.");

    let token = app.login("newcomer", "password1").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_protected_routes_reject_bad_tokens() {
    let app = TestApp::new().await;

    let (status, _) = app.request("GET", "/work-orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("GET", "/work-orders", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let now = Utc::now().timestamp();
    let forged = encode(
        &Header::new(Algorithm::HS256),
        &Claims { user_id: 1, username: "admin".into(), role: Role::Manager, iat: now, exp: now + 60 },
        &EncodingKey::from_secret(b"some-other-secret"),
    ).unwrap();
    let (status, _) = app.request("GET", "/work-orders", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = TestApp::new().await;
    let id = app.seed_user("admin", "admin", Role::Manager).await;

    let now = Utc::now().timestamp();
    let stale = encode(
        &Header::new(Algorithm::HS256),
        &Claims { user_id: id, username: "admin".into(), role: Role::Manager, iat: now - 7200, exp: now - 3600 },
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    ).unwrap();

    let identity = app.state.auth_service.verify(Some(&stale)).unwrap();
    assert!(identity.expired);

    let (status, _) = app.request("GET", "/work-orders", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
