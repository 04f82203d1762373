pub mod auth;
pub mod role;
pub mod user;
pub mod work_order;
