use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use crate::domain::models::{
    user::UserProfile,
    work_order::{StatusHistoryEntry, WorkOrderDetail, WorkOrderStatus},
};
use crate::domain::services::lifecycle::compute_duration;

/// Wire shape of a work order with its assignee and ledger.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderResponse {
    pub id: i64,
    pub work_order_number: String,
    pub product_name: String,
    pub quantity: i64,
    pub deadline: NaiveDate,
    pub status: WorkOrderStatus,
    pub assigned_to_id: Option<i64>,
    pub assigned_to: Option<UserProfile>,
    pub progress_notes: Vec<String>,
    pub status_history: Vec<StatusHistoryEntry>,
    /// Recomputed from the ledger on every read.
    pub duration: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkOrderDetail> for WorkOrderResponse {
    fn from(detail: WorkOrderDetail) -> Self {
        let duration = compute_duration(&detail.status_history);
        let order = detail.order;
        Self {
            id: order.id,
            work_order_number: order.work_order_number,
            product_name: order.product_name,
            quantity: order.quantity,
            deadline: order.deadline,
            status: order.status,
            assigned_to_id: order.assigned_to_id,
            assigned_to: detail.assigned_to,
            progress_notes: order.progress_notes,
            status_history: detail.status_history,
            duration,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
