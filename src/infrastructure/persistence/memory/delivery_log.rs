//! In-Memory Delivery Log

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::{DeliveryAttempt, DeliveryLogError, DeliveryLogPort};

/// 内存投递日志（按追加顺序保存）
pub struct InMemoryDeliveryLog {
    attempts: Mutex<Vec<DeliveryAttempt>>,
}

impl InMemoryDeliveryLog {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// 全部记录的快照（测试断言用）
    pub fn all(&self) -> Vec<DeliveryAttempt> {
        self.attempts.lock().expect("attempts lock").clone()
    }
}

impl Default for InMemoryDeliveryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryLogPort for InMemoryDeliveryLog {
    async fn append(&self, attempt: &DeliveryAttempt) -> Result<(), DeliveryLogError> {
        self.attempts
            .lock()
            .expect("attempts lock")
            .push(attempt.clone());
        Ok(())
    }

    async fn find_by_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Vec<DeliveryAttempt>, DeliveryLogError> {
        Ok(self
            .attempts
            .lock()
            .expect("attempts lock")
            .iter()
            .filter(|a| a.subscription_id == subscription_id)
            .cloned()
            .collect())
    }

    async fn find_by_event_type(
        &self,
        event_type: &str,
    ) -> Result<Vec<DeliveryAttempt>, DeliveryLogError> {
        Ok(self
            .attempts
            .lock()
            .expect("attempts lock")
            .iter()
            .filter(|a| a.event_type == event_type)
            .cloned()
            .collect())
    }
}
