//! Work order state machine.
//!
//! Everything here is pure: callers load the current state, ask this module
//! what the next state should be, and persist the answer atomically.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use crate::domain::models::{
    auth::Identity,
    work_order::{NewStatusEntry, NewWorkOrder, StatusHistoryEntry, WorkOrder, WorkOrderDetail, WorkOrderStatus},
};
use crate::domain::ports::WorkOrderUpdate;
use crate::error::AppError;

/// Fields a manager submits. The full editable set is required on every update.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerUpdate {
    pub product_name: String,
    pub quantity: i64,
    pub deadline: NaiveDate,
    pub status: WorkOrderStatus,
    pub assigned_to_id: Option<i64>,
    pub progress_note: Option<String>,
    pub quantity_completed: Option<i64>,
}

/// Fields an operator may submit for the current step of an order assigned to them.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorUpdate {
    pub status: WorkOrderStatus,
    pub progress_note: Option<String>,
    pub quantity_completed: Option<i64>,
}

/// An update request already validated against the schema of the caller's role.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCommand {
    Manager(ManagerUpdate),
    Operator(OperatorUpdate),
}

impl UpdateCommand {
    pub fn status(&self) -> WorkOrderStatus {
        match self {
            UpdateCommand::Manager(m) => m.status,
            UpdateCommand::Operator(o) => o.status,
        }
    }

    fn progress_note(&self) -> Option<&String> {
        match self {
            UpdateCommand::Manager(m) => m.progress_note.as_ref(),
            UpdateCommand::Operator(o) => o.progress_note.as_ref(),
        }
    }

    fn quantity_completed(&self) -> Option<i64> {
        match self {
            UpdateCommand::Manager(m) => m.quantity_completed,
            UpdateCommand::Operator(o) => o.quantity_completed,
        }
    }
}

/// Validated input for a new work order.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateWorkOrder {
    pub product_name: String,
    pub quantity: i64,
    pub deadline: NaiveDate,
    pub assigned_to_id: Option<i64>,
    pub seed_note: Option<String>,
}

/// `WO-YYYYMMDD-NNN` with a random three digit suffix.
pub fn generate_order_number<R: Rng>(date: NaiveDate, rng: &mut R) -> String {
    let suffix: u16 = rng.gen_range(0..1000);
    format!("WO-{}-{:03}", date.format("%Y%m%d"), suffix)
}

/// Builds the record and the single PENDING ledger entry for a new order.
pub fn plan_creation(input: CreateWorkOrder, work_order_number: String, now: DateTime<Utc>) -> (NewWorkOrder, NewStatusEntry) {
    let order = NewWorkOrder {
        work_order_number,
        product_name: input.product_name,
        quantity: input.quantity,
        deadline: input.deadline,
        assigned_to_id: input.assigned_to_id,
        progress_notes: input.seed_note.into_iter().collect(),
        created_at: now,
    };
    (order, NewStatusEntry::pending(now))
}

/// Managers may touch any order; operators only the ones assigned to them.
pub fn authorize_mutation(actor: &Identity, order: &WorkOrder) -> Result<(), AppError> {
    if actor.role.can_manage_work_orders() || order.assigned_to_id == Some(actor.user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Forbidden: You are not allowed to edit this work order.".into()))
    }
}

/// COMPLETED and CANCELED are final for operators. Managers may reopen them.
pub fn check_transition(actor: &Identity, from: WorkOrderStatus, to: WorkOrderStatus) -> Result<(), AppError> {
    if from == to || actor.role.can_manage_work_orders() || !from.is_terminal() {
        return Ok(());
    }
    Err(AppError::invalid_field(
        "status",
        format!("Work order is {} and cannot move to {}.", from, to),
    ))
}

/// Applies `command` to the current state of an order.
///
/// The returned record always carries the new status; `appended` is set only
/// when the status actually changed, so the stored status keeps matching the
/// last ledger entry.
pub fn plan_update(
    current: &WorkOrderDetail,
    actor: &Identity,
    command: &UpdateCommand,
    now: DateTime<Utc>,
) -> Result<WorkOrderUpdate, AppError> {
    authorize_mutation(actor, &current.order)?;

    let previous = current.order.status;
    let next = command.status();
    check_transition(actor, previous, next)?;

    let mut order = current.order.clone();
    order.status = next;
    order.updated_at = now;

    if let UpdateCommand::Manager(fields) = command {
        order.product_name = fields.product_name.clone();
        order.quantity = fields.quantity;
        order.deadline = fields.deadline;
        order.assigned_to_id = fields.assigned_to_id;
    }

    let appended = (next != previous).then(|| NewStatusEntry {
        status: next,
        started_at: now,
        completed_at: (next == WorkOrderStatus::Completed).then_some(now),
        progress_note: command.progress_note().cloned(),
        quantity_completed: command.quantity_completed(),
    });

    if let Some(entry) = &appended
        && let Some(completed_at) = entry.completed_at
        && let Some(seconds) = seconds_since_first_pending(&current.status_history, completed_at)
    {
        order.duration = Some(seconds);
    }

    if let UpdateCommand::Operator(fields) = command
        && matches!(next, WorkOrderStatus::InProgress | WorkOrderStatus::Completed)
        && let Some(note) = &fields.progress_note
    {
        order.progress_notes.push(note.clone());
    }

    Ok(WorkOrderUpdate { order, appended })
}

/// Seconds between the earliest PENDING entry and the latest COMPLETED entry,
/// or `None` when either is missing.
pub fn compute_duration(history: &[StatusHistoryEntry]) -> Option<i64> {
    let completed_at = history
        .iter()
        .rev()
        .find(|e| e.status == WorkOrderStatus::Completed)
        .and_then(|e| e.completed_at)?;
    seconds_since_first_pending(history, completed_at)
}

fn seconds_since_first_pending(history: &[StatusHistoryEntry], completed_at: DateTime<Utc>) -> Option<i64> {
    let started_at = history
        .iter()
        .find(|e| e.status == WorkOrderStatus::Pending)
        .map(|e| e.started_at)?;
    Some((completed_at - started_at).num_milliseconds().div_euclid(1000))
}
