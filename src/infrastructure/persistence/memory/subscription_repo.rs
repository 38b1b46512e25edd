//! In-Memory Subscription Repository

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::application::ports::{RepositoryError, SubscriptionRepositoryPort};
use crate::domain::Subscription;

/// 内存订阅仓储
pub struct InMemorySubscriptionRepository {
    subscriptions: DashMap<Uuid, Subscription>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
        }
    }
}

impl Default for InMemorySubscriptionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionRepositoryPort for InMemorySubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), RepositoryError> {
        self.subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscription>, RepositoryError> {
        Ok(self.subscriptions.get(&id).map(|s| s.clone()))
    }

    async fn find_all(&self) -> Result<Vec<Subscription>, RepositoryError> {
        Ok(self
            .subscriptions
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.subscriptions.remove(&id);
        Ok(())
    }
}
