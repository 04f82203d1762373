mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use work_order_tracker::domain::models::role::Role;

#[tokio::test]
async fn test_user_listing_is_role_scoped() {
    let app = TestApp::new().await;
    app.seed_user("admin", "admin", Role::Manager).await;
    let op1 = app.seed_user("operator1", "password1", Role::Operator).await;
    let op2 = app.seed_user("operator2", "password2", Role::Operator).await;

    let manager = app.login("admin", "admin").await;
    let (status, body) = app.request("GET", "/users", Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["users"].as_array().unwrap().iter().map(|u| u["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![op1, op2]);

    let operator = app.login("operator2", "password2").await;
    let (status, body) = app.request("GET", "/users", Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], op2);
    assert!(users[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_single_user_read_permissions() {
    let app = TestApp::new().await;
    app.seed_user("admin", "admin", Role::Manager).await;
    let op1 = app.seed_user("operator1", "password1", Role::Operator).await;
    let op2 = app.seed_user("operator2", "password2", Role::Operator).await;

    let operator = app.login("operator1", "password1").await;
    let (status, body) = app.request("GET", &format!("/users/{}", op1), Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "operator1");

    let (status, _) = app.request("GET", &format!("/users/{}", op2), Some(&operator), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let manager = app.login("admin", "admin").await;
    let (status, _) = app.request("GET", "/users/9999", Some(&manager), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manager_creates_updates_and_deletes_users() {
    let app = TestApp::new().await;
    app.seed_user("admin", "admin", Role::Manager).await;
    let manager = app.login("admin", "admin").await;

    let (status, body) = app.request("POST", "/users", Some(&manager), Some(json!({
        "username": "shiftlead", "password": "password1", "role": "PRODUCTION_MANAGER"
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "MANAGER");
    let id = body["user"]["id"].as_i64().unwrap();

    let (status, body) = app.request("PUT", &format!("/users/{}", id), Some(&manager), Some(json!({
        "password": "rotated-secret", "role": "OPERATOR"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "shiftlead");
    assert_eq!(body["user"]["role"], "OPERATOR");

    let (status, _) = app.request("POST", "/auth/login", None, Some(json!({
        "username": "shiftlead", "password": "password1"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    app.login("shiftlead", "rotated-secret").await;

    let (status, _) = app.request("PUT", &format!("/users/{}", id), Some(&manager), Some(json!({
        "password": "tiny"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.request("DELETE", &format!("/users/{}", id), Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully.");

    let (status, _) = app.request("DELETE", &format!("/users/{}", id), Some(&manager), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_operators_cannot_manage_users() {
    let app = TestApp::new().await;
    let op = app.seed_user("operator1", "password1", Role::Operator).await;
    let operator = app.login("operator1", "password1").await;

    let (status, _) = app.request("POST", "/users", Some(&operator), Some(json!({
        "username": "intruder1", "password": "password1"
    }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request("PUT", &format!("/users/{}", op), Some(&operator), Some(json!({
        "role": "MANAGER"
    }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request("DELETE", &format!("/users/{}", op), Some(&operator), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleting_assignee_unassigns_orders() {
    let app = TestApp::new().await;
    app.seed_user("admin", "admin", Role::Manager).await;
    let op = app.seed_user("operator1", "password1", Role::Operator).await;
    let manager = app.login("admin", "admin").await;

    let number = app.create_order(&manager, "Gear", 10, Some(op)).await;

    let (status, _) = app.request("DELETE", &format!("/users/{}", op), Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request("GET", &format!("/work-orders/{}", number), Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["workOrder"]["assignedToId"].is_null());
    assert!(body["workOrder"]["assignedTo"].is_null());
}
