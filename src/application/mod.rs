//! 应用层
//!
//! 端口定义与两个编排服务：SampleCache（单航道取或生成）、
//! SubscriptionRegistry（带缓存的订阅读路径）

pub mod error;
pub mod ports;
pub mod sample_cache;
pub mod subscription_registry;

pub use error::SampleCacheError;
pub use sample_cache::{SampleCache, SampleCacheConfig};
pub use subscription_registry::SubscriptionRegistry;
