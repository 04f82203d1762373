use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;
use crate::domain::models::{role::Role, work_order::WorkOrderStatus};
use crate::domain::services::lifecycle::{CreateWorkOrder, ManagerUpdate, OperatorUpdate, UpdateCommand};
use crate::error::{field_violations, AppError, FieldViolation};

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

impl CreateUserRequest {
    pub fn role(&self) -> Result<Role, AppError> {
        self.role.as_deref().map(parse_role).unwrap_or(Ok(Role::Operator))
    }
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn role(&self) -> Result<Option<Role>, AppError> {
        self.role.as_deref().map(parse_role).transpose()
    }
}

#[derive(Deserialize, Validate)]
pub struct CreateWorkOrderRequest {
    #[serde(rename = "productName")]
    #[validate(required(message = "productName is required."), length(min = 1, message = "productName must not be empty."))]
    pub product_name: Option<String>,
    #[validate(required(message = "quantity is required."), range(min = 1, message = "quantity must be a positive integer."))]
    pub quantity: Option<i64>,
    #[validate(required(message = "deadline is required."))]
    pub deadline: Option<String>,
    #[serde(rename = "assignedToId")]
    pub assigned_to_id: Option<i64>,
    #[serde(rename = "progressNote")]
    pub progress_note: Option<String>,
}

impl CreateWorkOrderRequest {
    pub fn into_input(mut self) -> Result<CreateWorkOrder, AppError> {
        self.product_name = trimmed(self.product_name);
        self.validate()?;
        let (Some(product_name), Some(quantity), Some(deadline)) = (self.product_name, self.quantity, self.deadline) else {
            return Err(AppError::Internal);
        };

        Ok(CreateWorkOrder {
            product_name,
            quantity,
            deadline: parse_deadline(&deadline)?,
            assigned_to_id: self.assigned_to_id,
            seed_note: non_empty(self.progress_note),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct ManagerUpdateRequest {
    #[serde(rename = "productName")]
    #[validate(required(message = "productName is required."), length(min = 1, message = "productName must not be empty."))]
    pub product_name: Option<String>,
    #[validate(required(message = "quantity is required."), range(min = 1, message = "quantity must be a positive integer."))]
    pub quantity: Option<i64>,
    #[validate(required(message = "deadline is required."))]
    pub deadline: Option<String>,
    #[validate(required(message = "status is required."))]
    pub status: Option<String>,
    /// Outer `None` means the key was left out; `Some(None)` is an explicit `null`.
    #[serde(rename = "assignedToId", default, deserialize_with = "present")]
    pub assigned_to_id: Option<Option<i64>>,
    #[serde(rename = "progressNote")]
    pub progress_note: Option<String>,
    #[serde(rename = "quantityCompleted")]
    #[validate(range(min = 0, message = "quantityCompleted must not be negative."))]
    pub quantity_completed: Option<i64>,
}

#[derive(Deserialize, Validate)]
pub struct OperatorUpdateRequest {
    #[validate(required(message = "status is required."))]
    pub status: Option<String>,
    #[serde(rename = "progressNote")]
    pub progress_note: Option<String>,
    #[serde(rename = "quantityCompleted")]
    #[validate(range(min = 0, message = "quantityCompleted must not be negative."))]
    pub quantity_completed: Option<i64>,
}

/// Reads an update body against the schema of the caller's role.
///
/// This runs exactly once per request; the rest of the update path only ever
/// sees the resulting [`UpdateCommand`].
pub fn resolve_update(role: Role, payload: Value) -> Result<UpdateCommand, AppError> {
    if role.can_manage_work_orders() {
        let mut req: ManagerUpdateRequest = from_body(payload)?;
        req.product_name = trimmed(req.product_name);

        let mut violations = req.validate().err().map(|e| field_violations(&e)).unwrap_or_default();
        if req.assigned_to_id.is_none() {
            violations.push(FieldViolation::new("assignedToId", "assignedToId is required (null unassigns the order)."));
        }
        if !violations.is_empty() {
            violations.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(AppError::Validation(violations));
        }

        let (Some(product_name), Some(quantity), Some(deadline), Some(status), Some(assigned_to_id)) =
            (req.product_name, req.quantity, req.deadline, req.status, req.assigned_to_id) else {
            return Err(AppError::Internal);
        };

        Ok(UpdateCommand::Manager(ManagerUpdate {
            product_name,
            quantity,
            deadline: parse_deadline(&deadline)?,
            status: parse_status(&status)?,
            assigned_to_id,
            progress_note: non_empty(req.progress_note),
            quantity_completed: req.quantity_completed,
        }))
    } else {
        let req: OperatorUpdateRequest = from_body(payload)?;
        req.validate()?;
        let Some(status) = req.status else {
            return Err(AppError::Internal);
        };

        Ok(UpdateCommand::Operator(OperatorUpdate {
            status: parse_status(&status)?,
            progress_note: non_empty(req.progress_note),
            quantity_completed: req.quantity_completed,
        }))
    }
}

fn from_body<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, AppError> {
    serde_json::from_value(payload).map_err(|e| AppError::invalid_field("body", e.to_string()))
}

/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp.
pub fn parse_deadline(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::invalid_field("deadline", "deadline must be a date (YYYY-MM-DD)."))
}

pub fn parse_status(raw: &str) -> Result<WorkOrderStatus, AppError> {
    raw.parse().map_err(|_| {
        AppError::invalid_field("status", "status must be one of PENDING, IN_PROGRESS, COMPLETED, CANCELED.")
    })
}

pub fn parse_role(raw: &str) -> Result<Role, AppError> {
    raw.parse().map_err(|_| AppError::invalid_field("role", "role must be MANAGER or OPERATOR."))
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn non_empty(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
