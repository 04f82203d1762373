use crate::domain::models::{
    role::Role,
    user::{NewUser, User, UserChanges},
    work_order::{NewStatusEntry, NewWorkOrder, WorkOrder, WorkOrderDetail},
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn update(&self, id: i64, changes: &UserChanges) -> Result<User, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

/// The result of running the lifecycle rules against a locked work order:
/// the record to write back and, when the status moved, the ledger entry to append.
#[derive(Debug, Clone)]
pub struct WorkOrderUpdate {
    pub order: WorkOrder,
    pub appended: Option<NewStatusEntry>,
}

/// Decides the update for a work order given its current, locked state.
/// Returning an error aborts the transaction without writing anything.
pub type UpdatePlanner<'a> = &'a (dyn Fn(&WorkOrderDetail) -> Result<WorkOrderUpdate, AppError> + Send + Sync);

#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// Inserts the order together with its first ledger entry in one transaction.
    async fn create(&self, order: &NewWorkOrder, first_entry: &NewStatusEntry) -> Result<WorkOrderDetail, AppError>;
    async fn find_by_number(&self, work_order_number: &str) -> Result<Option<WorkOrderDetail>, AppError>;
    async fn list_all(&self) -> Result<Vec<WorkOrderDetail>, AppError>;
    async fn list_by_assignee(&self, user_id: i64) -> Result<Vec<WorkOrderDetail>, AppError>;
    /// Bare order rows, without assignee or ledger. Enough for aggregation.
    async fn scan_orders(&self) -> Result<Vec<WorkOrder>, AppError>;
    /// Locks the order, hands its current state to `planner`, then writes the
    /// planned record and ledger entry atomically.
    async fn update_with(&self, work_order_number: &str, planner: UpdatePlanner<'_>) -> Result<WorkOrderDetail, AppError>;
    /// Removes the ledger entries first, then the order itself.
    async fn delete(&self, work_order_number: &str) -> Result<(), AppError>;
}
