//! 内存持久化实现
//!
//! 测试和嵌入场景用；接口与 SQLite 实现一致

mod delivery_log;
mod subscription_repo;

pub use delivery_log::InMemoryDeliveryLog;
pub use subscription_repo::InMemorySubscriptionRepository;
