use std::sync::Arc;
use crate::domain::ports::{UserRepository, WorkOrderRepository};
use crate::domain::services::{auth_service::AuthService, work_order_service::WorkOrderService};

#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<dyn UserRepository>,
    pub work_order_repo: Arc<dyn WorkOrderRepository>,
    pub auth_service: Arc<AuthService>,
    pub work_order_service: Arc<WorkOrderService>,
}
