use work_order_tracker::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::models::role::Role,
    infra::factory::{build_state, run_sqlite_migrations},
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::Value;

pub const TEST_SECRET: &str = "test-secret-do-not-use";

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret: TEST_SECRET.to_string(),
            token_ttl: Duration::from_secs(3600),
            seed_demo_data: false,
        };

        let state = Arc::new(build_state(&config, pool.clone()));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// Stores a user directly and returns its id.
    pub async fn seed_user(&self, username: &str, password: &str, role: Role) -> i64 {
        self.state.auth_service
            .register(username, password, role)
            .await
            .expect("Failed to seed user")
            .id
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self.request("POST", "/auth/login", None, Some(serde_json::json!({
            "username": username,
            "password": password
        }))).await;

        if status != StatusCode::OK {
            panic!("Login failed in test helper: status {} body {}", status, body);
        }

        body["token"].as_str().expect("No token in body").to_string()
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }

    /// Sends `body` verbatim, for payloads that are not valid JSON.
    pub async fn request_raw(&self, method: &str, uri: &str, token: Option<&str>, content_type: &str, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = builder.body(Body::from(body.to_string())).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Creates a work order as `manager_token` and returns its order number.
    pub async fn create_order(&self, manager_token: &str, product: &str, quantity: i64, assignee: Option<i64>) -> String {
        let (status, body) = self.request("POST", "/work-orders", Some(manager_token), Some(serde_json::json!({
            "productName": product,
            "quantity": quantity,
            "deadline": "2025-06-30",
            "assignedToId": assignee
        }))).await;

        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["workOrder"]["workOrderNumber"].as_str().unwrap().to_string()
    }

    pub async fn history_rows(&self, work_order_number: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM work_order_status_history h JOIN work_orders o ON o.id = h.work_order_id WHERE o.work_order_number = ?"
        )
            .bind(work_order_number)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
