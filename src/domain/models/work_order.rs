use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use super::user::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Pending,
    InProgress,
    Completed,
    Canceled,
}

impl WorkOrderStatus {
    pub const ALL: [WorkOrderStatus; 4] = [
        WorkOrderStatus::Pending,
        WorkOrderStatus::InProgress,
        WorkOrderStatus::Completed,
        WorkOrderStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "PENDING",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::Completed => "COMPLETED",
            WorkOrderStatus::Canceled => "CANCELED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Canceled)
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkOrderStatus::ALL.into_iter().find(|status| status.as_str() == s).ok_or(())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: i64,
    pub work_order_number: String,
    pub product_name: String,
    pub quantity: i64,
    pub deadline: NaiveDate,
    pub status: WorkOrderStatus,
    pub assigned_to_id: Option<i64>,
    #[sqlx(json)]
    pub progress_notes: Vec<String>,
    pub duration: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A work order that has not been stored yet.
pub struct NewWorkOrder {
    pub work_order_number: String,
    pub product_name: String,
    pub quantity: i64,
    pub deadline: NaiveDate,
    pub assigned_to_id: Option<i64>,
    pub progress_notes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub work_order_id: i64,
    pub status: WorkOrderStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress_note: Option<String>,
    pub quantity_completed: Option<i64>,
}

/// A ledger entry about to be appended. Entries are never edited after insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatusEntry {
    pub status: WorkOrderStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress_note: Option<String>,
    pub quantity_completed: Option<i64>,
}

impl NewStatusEntry {
    pub fn pending(at: DateTime<Utc>) -> Self {
        Self {
            status: WorkOrderStatus::Pending,
            started_at: at,
            completed_at: None,
            progress_note: None,
            quantity_completed: None,
        }
    }
}

/// A work order together with its assignee and its full, time-ordered ledger.
#[derive(Debug, Clone)]
pub struct WorkOrderDetail {
    pub order: WorkOrder,
    pub assigned_to: Option<UserProfile>,
    pub status_history: Vec<StatusHistoryEntry>,
}

impl WorkOrderDetail {
    pub fn latest_entry(&self) -> Option<&StatusHistoryEntry> {
        self.status_history.last()
    }
}
