use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{LoginRequest, RegisterRequest};
use crate::domain::models::{auth::TokenResponse, role::Role, user::UserProfile};
use serde_json::json;
use std::sync::Arc;

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.auth_service.login(&payload.username, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

/// Self-service sign up. New accounts are always operators.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(&payload.username, &payload.password, Role::Operator).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "User registered successfully.",
        "user": UserProfile::from(user)
    }))))
}
