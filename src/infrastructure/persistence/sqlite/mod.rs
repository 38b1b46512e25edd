//! SQLite 持久化
//!
//! 订阅表 + 投递日志表

mod database;
mod delivery_log_repo;
mod subscription_repo;

pub use database::{create_pool, run_migrations, DatabaseConfig, DbPool};
pub use delivery_log_repo::SqliteDeliveryLog;
pub use subscription_repo::SqliteSubscriptionRepository;
