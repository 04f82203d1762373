use chrono::{Days, Utc};
use tracing::info;
use crate::domain::{
    models::{auth::Identity, role::Role},
    services::{
        auth_service::AuthService,
        lifecycle::CreateWorkOrder,
        work_order_service::WorkOrderService,
    },
};
use crate::error::AppError;

pub const DEMO_MANAGER: &str = "admin";
pub const DEMO_OPERATOR: &str = "operator";
pub const DEMO_PASSWORD: &str = "admin";

const DEMO_PRODUCTS: [(&str, i64, u64); 2] = [
    ("Gearbox Housing", 120, 7),
    ("Drive Shaft", 40, 14),
];

/// Creates the demo manager, the demo operator and two pending orders for the
/// operator. Callers only invoke this against an empty user table.
pub async fn seed_demo_data(auth: &AuthService, work_orders: &WorkOrderService) -> Result<(), AppError> {
    let manager = auth.register(DEMO_MANAGER, DEMO_PASSWORD, Role::Manager).await?;
    let operator = auth.register(DEMO_OPERATOR, DEMO_PASSWORD, Role::Operator).await?;

    let actor = Identity {
        user_id: manager.id,
        username: manager.username.clone(),
        role: manager.role,
        expired: false,
    };

    let today = Utc::now().date_naive();
    for (product_name, quantity, lead_days) in DEMO_PRODUCTS {
        let deadline = today.checked_add_days(Days::new(lead_days)).unwrap_or(today);
        work_orders.create(&actor, CreateWorkOrder {
            product_name: product_name.to_string(),
            quantity,
            deadline,
            assigned_to_id: Some(operator.id),
            seed_note: None,
        }).await?;
    }

    info!("Seeded demo users '{}' and '{}' with {} work orders", DEMO_MANAGER, DEMO_OPERATOR, DEMO_PRODUCTS.len());
    Ok(())
}
