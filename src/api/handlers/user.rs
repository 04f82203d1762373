use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::{AuthUser, ManagerUser};
use crate::api::dtos::requests::{CreateUserRequest, UpdateUserRequest};
use crate::domain::models::{role::Role, user::{User, UserChanges}};
use crate::domain::services::auth_service::{credential_policy, hash_password};
use crate::error::{AppError, FieldViolation};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Managers get every operator; an operator only ever sees themselves.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = if identity.role.can_manage_users() {
        state.user_repo.list_by_role(Role::Operator).await?
    } else {
        state.user_repo.find_by_id(identity.user_id).await?.into_iter().collect()
    };

    Ok(Json(json!({ "users": users })))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ManagerUser(manager): ManagerUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = payload.role()?;
    let user = state.auth_service.register(&payload.username, &payload.password, role).await?;

    info!("Manager {} created user {} ({})", manager.user_id, user.id, user.role);
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !identity.role.can_manage_users() && identity.user_id != user_id {
        return Err(AppError::Forbidden("Forbidden: You can only view your own account.".into()));
    }

    let user = state.user_repo.find_by_id(user_id).await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    Ok(Json(json!({ "user": user })))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    ManagerUser(manager): ManagerUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut violations = Vec::new();
    if let Some(username) = &payload.username && !credential_policy(username) {
        violations.push(FieldViolation::new("username", "Username must be at least 7 characters."));
    }
    if let Some(password) = &payload.password && !credential_policy(password) {
        violations.push(FieldViolation::new("password", "Password must be at least 7 characters."));
    }
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let changes = UserChanges {
        role: payload.role()?,
        password_hash: payload.password.as_deref().map(hash_password).transpose()?,
        username: payload.username,
    };

    let user = state.user_repo.update(user_id, &changes).await
        .map_err(|e| if e.is_unique_violation() { AppError::DuplicateUsername } else { e })?;

    info!("Manager {} updated user {}", manager.user_id, user.id);
    Ok(Json(json!({ "user": user })))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    ManagerUser(manager): ManagerUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.user_repo.delete(user_id).await?;

    info!("Manager {} deleted user {}", manager.user_id, user_id);
    Ok(Json(json!({ "message": "User deleted successfully." })))
}
