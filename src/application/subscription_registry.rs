//! Subscription Registry - 带缓存的订阅读路径
//!
//! 分发器每个事件都要解析订阅者。这里不做每事件一次的全表扫描，
//! 而是把订阅集合做成小的可缓存快照，订阅被编辑时由后台流程显式
//! 调用 invalidate() 失效。

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::application::ports::{RepositoryError, SubscriptionRepositoryPort};
use crate::domain::Subscription;

/// 订阅注册表
pub struct SubscriptionRegistry {
    repo: Arc<dyn SubscriptionRepositoryPort>,
    /// 已加载的订阅快照；None 表示需要从仓储重新加载
    snapshot: RwLock<Option<Arc<Vec<Subscription>>>>,
}

impl SubscriptionRegistry {
    pub fn new(repo: Arc<dyn SubscriptionRepositoryPort>) -> Self {
        Self {
            repo,
            snapshot: RwLock::new(None),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 返回订阅了该事件类型的活跃订阅
    pub async fn matching(&self, event_type: &str) -> Result<Vec<Subscription>, RepositoryError> {
        let snapshot = self.load().await?;
        Ok(snapshot
            .iter()
            .filter(|s| s.matches(event_type))
            .cloned()
            .collect())
    }

    /// 当前快照中的全部订阅
    pub async fn all(&self) -> Result<Arc<Vec<Subscription>>, RepositoryError> {
        self.load().await
    }

    /// 订阅被创建/编辑/删除后由后台流程调用，下次读取时重新加载
    pub async fn invalidate(&self) {
        let mut guard = self.snapshot.write().await;
        *guard = None;
        tracing::debug!("Subscription registry snapshot invalidated");
    }

    async fn load(&self) -> Result<Arc<Vec<Subscription>>, RepositoryError> {
        {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                return Ok(snapshot.clone());
            }
        }

        let mut guard = self.snapshot.write().await;
        // 等写锁期间可能已有人加载过
        if let Some(snapshot) = guard.as_ref() {
            return Ok(snapshot.clone());
        }

        let subscriptions = Arc::new(self.repo.find_all().await?);
        tracing::debug!(
            count = subscriptions.len(),
            "Subscription registry snapshot loaded"
        );
        *guard = Some(subscriptions.clone());
        Ok(subscriptions)
    }
}
