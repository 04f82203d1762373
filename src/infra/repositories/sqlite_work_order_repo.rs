use std::collections::HashMap;
use crate::domain::{
    models::{
        user::UserProfile,
        work_order::{NewStatusEntry, NewWorkOrder, StatusHistoryEntry, WorkOrder, WorkOrderDetail},
    },
    ports::{UpdatePlanner, WorkOrderRepository},
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{types::Json, SqliteConnection, SqlitePool};
use tracing::{debug, error};

const ORDER_COLUMNS: &str = "id, work_order_number, product_name, quantity, deadline, status, assigned_to_id, progress_notes, duration, created_at, updated_at";
const HISTORY_COLUMNS: &str = "id, work_order_id, status, started_at, completed_at, progress_note, quantity_completed";

pub struct SqliteWorkOrderRepo {
    pool: SqlitePool,
}

impl SqliteWorkOrderRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkOrderRepository for SqliteWorkOrderRepo {
    async fn create(&self, order: &NewWorkOrder, first_entry: &NewStatusEntry) -> Result<WorkOrderDetail, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, WorkOrder>(&format!(
            "INSERT INTO work_orders (work_order_number, product_name, quantity, deadline, status, assigned_to_id, progress_notes, duration, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
             RETURNING {ORDER_COLUMNS}"
        ))
            .bind(&order.work_order_number)
            .bind(&order.product_name)
            .bind(order.quantity)
            .bind(order.deadline)
            .bind(first_entry.status)
            .bind(order.assigned_to_id)
            .bind(Json(&order.progress_notes))
            .bind(order.created_at)
            .bind(order.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        append_entry(&mut tx, created.id, first_entry).await?;
        let detail = with_relations(&mut tx, created).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(detail)
    }

    async fn find_by_number(&self, work_order_number: &str) -> Result<Option<WorkOrderDetail>, AppError> {
        // A read transaction keeps the order row and its ledger on one snapshot.
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let found = load_by_number(&mut tx, work_order_number).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(found)
    }

    async fn list_all(&self) -> Result<Vec<WorkOrderDetail>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let orders = sqlx::query_as::<_, WorkOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM work_orders ORDER BY id ASC"
        ))
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let history = sqlx::query_as::<_, StatusHistoryEntry>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM work_order_status_history ORDER BY work_order_id ASC, started_at ASC, id ASC"
        ))
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let assignees = sqlx::query_as::<_, UserProfile>(
            "SELECT id, username, role FROM users WHERE id IN (SELECT assigned_to_id FROM work_orders)"
        )
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(assemble(orders, history, assignees))
    }

    async fn list_by_assignee(&self, user_id: i64) -> Result<Vec<WorkOrderDetail>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let orders = sqlx::query_as::<_, WorkOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM work_orders WHERE assigned_to_id = ? ORDER BY id ASC"
        ))
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let history = sqlx::query_as::<_, StatusHistoryEntry>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM work_order_status_history
             WHERE work_order_id IN (SELECT id FROM work_orders WHERE assigned_to_id = ?)
             ORDER BY work_order_id ASC, started_at ASC, id ASC"
        ))
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let assignees = sqlx::query_as::<_, UserProfile>("SELECT id, username, role FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(assemble(orders, history, assignees))
    }

    async fn scan_orders(&self) -> Result<Vec<WorkOrder>, AppError> {
        sqlx::query_as::<_, WorkOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM work_orders ORDER BY id ASC"
        ))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_with(&self, work_order_number: &str, planner: UpdatePlanner<'_>) -> Result<WorkOrderDetail, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Writing first takes SQLite's write lock before anything is read, so two
        // updates of the same order can never plan against the same snapshot.
        let claimed = sqlx::query("UPDATE work_orders SET updated_at = updated_at WHERE work_order_number = ?")
            .bind(work_order_number)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::NotFound("Work order not found.".into()));
        }

        let current = load_by_number(&mut tx, work_order_number).await?
            .ok_or_else(|| AppError::NotFound("Work order not found.".into()))?;

        let planned = planner(&current)?;
        let order = &planned.order;

        sqlx::query(
            r#"UPDATE work_orders
               SET product_name = ?, quantity = ?, deadline = ?, status = ?, assigned_to_id = ?,
                   progress_notes = ?, duration = ?, updated_at = ?
               WHERE id = ?"#
        )
            .bind(&order.product_name)
            .bind(order.quantity)
            .bind(order.deadline)
            .bind(order.status)
            .bind(order.assigned_to_id)
            .bind(Json(&order.progress_notes))
            .bind(order.duration)
            .bind(order.updated_at)
            .bind(order.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Work order update failed for {}: {:?}", work_order_number, e);
                AppError::Database(e)
            })?;

        if let Some(entry) = &planned.appended {
            append_entry(&mut tx, order.id, entry).await?;
            debug!("Appended {} entry to work order {}", entry.status, work_order_number);
        }

        let updated = load_by_number(&mut tx, work_order_number).await?
            .ok_or(AppError::Internal)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn delete(&self, work_order_number: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM work_orders WHERE work_order_number = ?")
            .bind(work_order_number)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Work order not found.".into()))?;

        // Ledger rows are owned by the order and must go first.
        sqlx::query("DELETE FROM work_order_status_history WHERE work_order_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("DELETE FROM work_orders WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}

async fn append_entry(conn: &mut SqliteConnection, work_order_id: i64, entry: &NewStatusEntry) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO work_order_status_history (work_order_id, status, started_at, completed_at, progress_note, quantity_completed)
         VALUES (?, ?, ?, ?, ?, ?)"
    )
        .bind(work_order_id)
        .bind(entry.status)
        .bind(entry.started_at)
        .bind(entry.completed_at)
        .bind(&entry.progress_note)
        .bind(entry.quantity_completed)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;
    Ok(())
}

async fn load_by_number(conn: &mut SqliteConnection, work_order_number: &str) -> Result<Option<WorkOrderDetail>, AppError> {
    let order = sqlx::query_as::<_, WorkOrder>(&format!(
        "SELECT {ORDER_COLUMNS} FROM work_orders WHERE work_order_number = ?"
    ))
        .bind(work_order_number)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    match order {
        Some(order) => Ok(Some(with_relations(conn, order).await?)),
        None => Ok(None),
    }
}

async fn with_relations(conn: &mut SqliteConnection, order: WorkOrder) -> Result<WorkOrderDetail, AppError> {
    let status_history = sqlx::query_as::<_, StatusHistoryEntry>(&format!(
        "SELECT {HISTORY_COLUMNS} FROM work_order_status_history WHERE work_order_id = ? ORDER BY started_at ASC, id ASC"
    ))
        .bind(order.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    let assigned_to = match order.assigned_to_id {
        Some(user_id) => sqlx::query_as::<_, UserProfile>("SELECT id, username, role FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(AppError::Database)?,
        None => None,
    };

    Ok(WorkOrderDetail { order, assigned_to, status_history })
}

fn assemble(orders: Vec<WorkOrder>, history: Vec<StatusHistoryEntry>, assignees: Vec<UserProfile>) -> Vec<WorkOrderDetail> {
    let mut ledgers: HashMap<i64, Vec<StatusHistoryEntry>> = HashMap::new();
    for entry in history {
        ledgers.entry(entry.work_order_id).or_default().push(entry);
    }
    let users: HashMap<i64, UserProfile> = assignees.into_iter().map(|u| (u.id, u)).collect();

    orders
        .into_iter()
        .map(|order| WorkOrderDetail {
            assigned_to: order.assigned_to_id.and_then(|id| users.get(&id).cloned()),
            status_history: ledgers.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect()
}
