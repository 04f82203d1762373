mod common;

use chrono::NaiveDate;
use common::TestApp;
use std::collections::HashSet;
use tokio::task::JoinSet;
use work_order_tracker::domain::{
    models::{auth::Identity, role::Role, work_order::WorkOrderStatus},
    services::lifecycle::{CreateWorkOrder, OperatorUpdate, UpdateCommand},
};

fn identity(user_id: i64, username: &str, role: Role) -> Identity {
    Identity { user_id, username: username.into(), role, expired: false }
}

fn gear_order(assigned_to_id: Option<i64>) -> CreateWorkOrder {
    CreateWorkOrder {
        product_name: "Gear".into(),
        quantity: 10,
        deadline: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        assigned_to_id,
        seed_note: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_keep_status_and_ledger_in_step() {
    let app = TestApp::new().await;
    let manager_id = app.seed_user("admin", "admin", Role::Manager).await;
    let operator_id = app.seed_user("operator1", "password1", Role::Operator).await;

    let manager = identity(manager_id, "admin", Role::Manager);
    let operator = identity(operator_id, "operator1", Role::Operator);

    let created = app.state.work_order_service.create(&manager, gear_order(Some(operator_id))).await.unwrap();
    let number = created.order.work_order_number.clone();

    let mut set = JoinSet::new();
    for i in 0..12 {
        let state = app.state.clone();
        let operator = operator.clone();
        let number = number.clone();
        set.spawn(async move {
            let status = if i % 2 == 0 { WorkOrderStatus::InProgress } else { WorkOrderStatus::Pending };
            let command = UpdateCommand::Operator(OperatorUpdate {
                status,
                progress_note: Some(format!("step {}", i)),
                quantity_completed: Some(1),
            });
            state.work_order_service.update(&operator, &number, command).await
        });
    }

    // Readers racing the writers must never see a status without its entry.
    for _ in 0..6 {
        let state = app.state.clone();
        let number = number.clone();
        set.spawn(async move {
            let read = state.work_order_service.get(&number).await;
            if let Ok(detail) = &read {
                assert_eq!(Some(detail.order.status), detail.latest_entry().map(|e| e.status));
            }
            read
        });
    }

    while let Some(joined) = set.join_next().await {
        let detail = joined.expect("task panicked").expect("update failed");
        assert_eq!(Some(detail.order.status), detail.latest_entry().map(|e| e.status));
    }

    let finished = app.state.work_order_service.get(&number).await.unwrap();
    assert_eq!(Some(finished.order.status), finished.latest_entry().map(|e| e.status));

    // Every appended entry is a real transition.
    for pair in finished.status_history.windows(2) {
        assert_ne!(pair[0].status, pair[1].status);
        assert!(pair[0].started_at <= pair[1].started_at);
    }

    let entries = app.history_rows(&number).await;
    assert_eq!(entries, finished.status_history.len() as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creation_yields_unique_numbers() {
    let app = TestApp::new().await;
    let manager_id = app.seed_user("admin", "admin", Role::Manager).await;
    let manager = identity(manager_id, "admin", Role::Manager);

    let mut set = JoinSet::new();
    for _ in 0..20 {
        let state = app.state.clone();
        let manager = manager.clone();
        set.spawn(async move {
            state.work_order_service.create(&manager, gear_order(None)).await
        });
    }

    let mut numbers = HashSet::new();
    while let Some(joined) = set.join_next().await {
        let detail = joined.expect("task panicked").expect("creation failed");
        assert_eq!(detail.status_history.len(), 1);
        assert!(numbers.insert(detail.order.work_order_number));
    }
    assert_eq!(numbers.len(), 20);
}
