use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{UserRepository, WorkOrderRepository};
use crate::domain::services::{
    auth_service::AuthService,
    defaults::seed_demo_data,
    work_order_service::WorkOrderService,
};
use crate::error::AppError;
use crate::infra::repositories::{
    sqlite_user_repo::SqliteUserRepo,
    sqlite_work_order_repo::SqliteWorkOrderRepo,
};
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| AppError::InternalWithMsg(format!("invalid DATABASE_URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .map_err(AppError::Database)?;

    run_sqlite_migrations(&pool).await?;

    let state = build_state(config, pool);

    if config.seed_demo_data && state.user_repo.count().await? == 0 {
        seed_demo_data(&state.auth_service, &state.work_order_service).await?;
    }

    Ok(state)
}

/// Wires repositories and services over an already migrated pool.
pub fn build_state(config: &Config, pool: SqlitePool) -> AppState {
    let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepo::new(pool.clone()));
    let work_order_repo: Arc<dyn WorkOrderRepository> = Arc::new(SqliteWorkOrderRepo::new(pool));

    let auth_service = Arc::new(AuthService::new(user_repo.clone(), config));
    let work_order_service = Arc::new(WorkOrderService::new(work_order_repo.clone(), user_repo.clone()));

    AppState {
        user_repo,
        work_order_repo,
        auth_service,
        work_order_service,
    }
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("migrations failed: {}", e)))
}
