//! Delivery Log Port - 投递审计日志抽象
//!
//! 每次 HTTP 尝试（不是每个事件）追加一行，构成完整的审计轨迹。
//! 只追加，不修改。
//!
//! 不变量：对给定 (event, subscription)，attempt_number 为 1..N 且
//! 时间戳单调递增；序列以一条 Success 或恰好 max_attempts 条 Failed 终止。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 投递日志错误
#[derive(Debug, Error)]
pub enum DeliveryLogError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 单次尝试的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Success,
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Success => "success",
            DeliveryOutcome::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(DeliveryOutcome::Success),
            "failed" => Some(DeliveryOutcome::Failed),
            _ => None,
        }
    }
}

/// 单次投递尝试记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub subscription_id: Uuid,
    pub event_type: String,
    /// 从 1 开始编号
    pub attempt_number: u32,
    /// HTTP 状态码；网络错误/超时时为 None
    pub status_code: Option<u16>,
    pub outcome: DeliveryOutcome,
    pub error_message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Delivery Log Port
#[async_trait]
pub trait DeliveryLogPort: Send + Sync {
    /// 追加一条尝试记录
    async fn append(&self, attempt: &DeliveryAttempt) -> Result<(), DeliveryLogError>;

    /// 按订阅查询（审计视图用），按发生顺序返回
    async fn find_by_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Vec<DeliveryAttempt>, DeliveryLogError>;

    /// 按事件类型查询，按发生顺序返回
    async fn find_by_event_type(
        &self,
        event_type: &str,
    ) -> Result<Vec<DeliveryAttempt>, DeliveryLogError>;
}
