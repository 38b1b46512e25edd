//! 领域层 - 纯类型定义
//!
//! 不依赖任何基础设施，只描述集成层的核心概念

pub mod event;
pub mod sample;
pub mod subscription;

pub use event::{DomainEvent, WebhookEnvelope};
pub use sample::{CacheKey, CachedSample, SAMPLE_CONTENT_TYPE};
pub use subscription::Subscription;
