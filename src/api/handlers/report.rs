use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::role::Role;
use crate::domain::services::reports::{operator_summary, product_summary};
use crate::error::AppError;
use serde_json::json;
use std::sync::Arc;

pub async fn get_operator_summary(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    require_report_access(identity.role)?;
    let operators = state.user_repo.list_by_role(Role::Operator).await?;
    let orders = state.work_order_repo.scan_orders().await?;

    Ok(Json(json!({ "reports": operator_summary(&operators, &orders) })))
}

pub async fn get_work_order_summary(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    require_report_access(identity.role)?;
    let orders = state.work_order_repo.scan_orders().await?;
    Ok(Json(json!({ "report": product_summary(&orders) })))
}

fn require_report_access(role: Role) -> Result<(), AppError> {
    if role.can_view_reports() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Forbidden: manager role required.".into()))
    }
}
