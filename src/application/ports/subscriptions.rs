//! Subscription Repository Port - 订阅存储抽象
//!
//! 订阅的创建/编辑由后台 CRUD 流程完成，这里定义的是分发器的读路径
//! 和 CRUD 流程共用的存储接口。

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::Subscription;

/// 仓储错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Subscription Repository Port
#[async_trait]
pub trait SubscriptionRepositoryPort: Send + Sync {
    /// 保存订阅（插入或更新）
    async fn save(&self, subscription: &Subscription) -> Result<(), RepositoryError>;

    /// 按 ID 查找
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscription>, RepositoryError>;

    /// 获取所有订阅
    async fn find_all(&self) -> Result<Vec<Subscription>, RepositoryError>;

    /// 删除订阅
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
