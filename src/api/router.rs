use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{auth, health, report, user, work_order};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))

        // Users
        .route("/users", get(user::list_users).post(user::create_user))
        .route("/users/{id}", get(user::get_user).put(user::update_user).delete(user::delete_user))

        // Work orders
        .route("/work-orders", get(work_order::list_work_orders).post(work_order::create_work_order))
        .route(
            "/work-orders/{work_order_number}",
            get(work_order::get_work_order).put(work_order::update_work_order).delete(work_order::delete_work_order),
        )

        // Reports
        .route("/reports/operator-summary", get(report::get_operator_summary))
        .route("/reports/work-order-summary", get(report::get_work_order_summary))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
