use axum::{extract::{rejection::JsonRejection, State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::{AuthUser, ManagerUser};
use crate::api::dtos::{
    requests::{resolve_update, CreateWorkOrderRequest},
    responses::WorkOrderResponse,
};
use crate::error::AppError;
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn list_work_orders(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let orders: Vec<WorkOrderResponse> = state.work_order_service.list(&identity).await?
        .into_iter()
        .map(WorkOrderResponse::from)
        .collect();

    Ok(Json(json!({ "data": orders })))
}

pub async fn create_work_order(
    State(state): State<Arc<AppState>>,
    ManagerUser(manager): ManagerUser,
    Json(payload): Json<CreateWorkOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = payload.into_input()?;
    let created = state.work_order_service.create(&manager, input).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Work order created successfully.",
        "workOrder": WorkOrderResponse::from(created)
    }))))
}

pub async fn get_work_order(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(work_order_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.work_order_service.get(&work_order_number).await?;
    Ok(Json(json!({ "workOrder": WorkOrderResponse::from(detail) })))
}

pub async fn update_work_order(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(work_order_number): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let command = payload
        .map_err(|rejection| AppError::invalid_field("body", rejection.body_text()))
        .and_then(|Json(payload)| resolve_update(identity.role, payload));

    // Ownership is settled before the payload's own errors are reported.
    state.work_order_service.authorize_update(&identity, &work_order_number).await?;
    let updated = state.work_order_service.update(&identity, &work_order_number, command?).await?;

    Ok(Json(json!({
        "message": "Work order updated successfully.",
        "workOrder": WorkOrderResponse::from(updated)
    })))
}

pub async fn delete_work_order(
    State(state): State<Arc<AppState>>,
    ManagerUser(manager): ManagerUser,
    Path(work_order_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.work_order_service.delete(&manager, &work_order_number).await?;
    Ok(Json(json!({ "message": "Work order deleted successfully." })))
}
