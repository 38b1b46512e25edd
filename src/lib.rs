//! Voxgate - 外部服务集成层
//!
//! 站点本体（页面渲染、后台 CRUD、鉴权）之外的集成层，把不可靠、计费、
//! 异步的外部依赖包装成可靠、廉价、同步的内部接口：
//!
//! - SampleCache: 内容寻址的语音样本缓存（一次生成、永久存储、命中直接返回）
//! - WebhookDispatcher: 领域事件可靠分发（签名、重试、投递审计）
//!
//! 架构设计: Hexagonal Architecture (Ports & Adapters)
//!
//! 领域层 (domain/):
//! - CacheKey / CachedSample: 缓存键与样本对象
//! - DomainEvent / WebhookEnvelope: 领域事件与出站报文
//! - Subscription: Webhook 订阅
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SynthesisPort, BlobStorePort, SubscriptionRepositoryPort, DeliveryLogPort）
//! - SampleCache: 单航道（single-flight）取或生成服务
//! - SubscriptionRegistry: 带缓存的订阅读路径
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 语音合成 HTTP 客户端、对象存储 HTTP 客户端（含测试用 Fake）
//! - Persistence: SQLite + 内存实现（订阅、投递日志）
//! - Webhook: 分发器、HMAC 签名、HTTP 传输

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::{load_config, AppConfig};
pub use logging::init_tracing;
