pub mod sqlite_user_repo;
pub mod sqlite_work_order_repo;
