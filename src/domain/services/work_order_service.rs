use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn};
use crate::domain::{
    models::{auth::Identity, work_order::WorkOrderDetail},
    ports::{UserRepository, WorkOrderRepository},
    services::lifecycle::{self, CreateWorkOrder, UpdateCommand},
};
use crate::error::AppError;

const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Orchestrates the lifecycle rules against the work order store.
pub struct WorkOrderService {
    orders: Arc<dyn WorkOrderRepository>,
    users: Arc<dyn UserRepository>,
}

impl WorkOrderService {
    pub fn new(orders: Arc<dyn WorkOrderRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { orders, users }
    }

    pub async fn create(&self, actor: &Identity, input: CreateWorkOrder) -> Result<WorkOrderDetail, AppError> {
        require_manager(actor)?;
        self.ensure_assignee_exists(input.assigned_to_id).await?;

        // The suffix is random, so two orders on the same day can collide.
        // Regenerate a bounded number of times instead of failing the first clash.
        for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
            let now = Utc::now();
            let number = lifecycle::generate_order_number(now.date_naive(), &mut rand::thread_rng());
            let (order, first_entry) = lifecycle::plan_creation(input.clone(), number, now);

            match self.orders.create(&order, &first_entry).await {
                Ok(created) => {
                    info!("Created work order {} ({})", created.order.work_order_number, created.order.id);
                    return Ok(created);
                }
                Err(e) if e.is_unique_violation() => {
                    warn!("Work order number {} already taken (attempt {})", order.work_order_number, attempt);
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::InternalWithMsg("could not allocate a unique work order number".into()))
    }

    pub async fn get(&self, work_order_number: &str) -> Result<WorkOrderDetail, AppError> {
        self.orders.find_by_number(work_order_number).await?
            .ok_or_else(|| AppError::NotFound("Work order not found.".into()))
    }

    pub async fn list(&self, actor: &Identity) -> Result<Vec<WorkOrderDetail>, AppError> {
        if actor.role.sees_all_work_orders() {
            self.orders.list_all().await
        } else {
            self.orders.list_by_assignee(actor.user_id).await
        }
    }

    /// Fails with `NotFound` or `Forbidden` before the payload is even looked at,
    /// so ownership errors win over validation errors.
    pub async fn authorize_update(&self, actor: &Identity, work_order_number: &str) -> Result<(), AppError> {
        let current = self.get(work_order_number).await?;
        lifecycle::authorize_mutation(actor, &current.order)
    }

    pub async fn update(&self, actor: &Identity, work_order_number: &str, command: UpdateCommand) -> Result<WorkOrderDetail, AppError> {
        if let UpdateCommand::Manager(fields) = &command {
            self.ensure_assignee_exists(fields.assigned_to_id).await?;
        }

        let planner = |current: &WorkOrderDetail| lifecycle::plan_update(current, actor, &command, Utc::now());
        let updated = self.orders.update_with(work_order_number, &planner).await?;

        info!(
            "Work order {} updated by user {} (status {})",
            work_order_number, actor.user_id, updated.order.status
        );
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Identity, work_order_number: &str) -> Result<(), AppError> {
        require_manager(actor)?;
        self.orders.delete(work_order_number).await?;
        info!("Deleted work order {}", work_order_number);
        Ok(())
    }

    async fn ensure_assignee_exists(&self, assigned_to_id: Option<i64>) -> Result<(), AppError> {
        if let Some(user_id) = assigned_to_id
            && self.users.find_by_id(user_id).await?.is_none()
        {
            return Err(AppError::invalid_field("assignedToId", "Invalid assignedToId."));
        }
        Ok(())
    }
}

fn require_manager(actor: &Identity) -> Result<(), AppError> {
    if actor.role.can_manage_work_orders() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Forbidden: manager role required.".into()))
    }
}
