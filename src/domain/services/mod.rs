pub mod auth_service;
pub mod defaults;
pub mod lifecycle;
pub mod reports;
pub mod work_order_service;
