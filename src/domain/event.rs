//! Domain Events & Webhook Envelope - 领域事件与出站报文
//!
//! 事件载荷是已知形状的 tagged union，而不是任意 JSON blob，
//! 这样签名/序列化契约才是精确可测的。
//!
//! 出站报文格式（JSON body）:
//! `{ "event": "<type>", "data": { ... }, "timestamp": "<ISO-8601>", "source": "<string>" }`

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 领域事件
///
/// 由站点的 CRUD 层在领域动作发生时抛出（书籍上传、用户注册等），
/// 在所有投递尝试结束或放弃之前只存在于内存中。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum DomainEvent {
    /// 书籍创建（上传完成）
    #[serde(rename = "book.created")]
    BookCreated { book_id: Uuid, title: String },
    /// 书籍更新
    #[serde(rename = "book.updated")]
    BookUpdated { book_id: Uuid, title: String },
    /// 书籍删除
    #[serde(rename = "book.deleted")]
    BookDeleted { book_id: Uuid },
    /// 用户注册
    #[serde(rename = "user.registered")]
    UserRegistered { user_id: Uuid, plan: String },
    /// 用户套餐变更
    #[serde(rename = "plan.changed")]
    PlanChanged { user_id: Uuid, plan: String },
    /// 语音样本生成完成
    #[serde(rename = "sample.generated")]
    SampleGenerated { voice_id: String, object_url: String },
}

impl DomainEvent {
    /// 事件类型字符串（与订阅的 event_types 匹配）
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::BookCreated { .. } => "book.created",
            DomainEvent::BookUpdated { .. } => "book.updated",
            DomainEvent::BookDeleted { .. } => "book.deleted",
            DomainEvent::UserRegistered { .. } => "user.registered",
            DomainEvent::PlanChanged { .. } => "plan.changed",
            DomainEvent::SampleGenerated { .. } => "sample.generated",
        }
    }
}

/// 出站 Webhook 报文
///
/// 每个事件只序列化一次：所有订阅、所有重试发送的是同一份字节，
/// 签名也是对这份字节计算的（接收端对原始 body 重算比对）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(flatten)]
    pub event: DomainEvent,
    pub timestamp: String,
    pub source: String,
}

impl WebhookEnvelope {
    pub fn new(event: DomainEvent, source: impl Into<String>) -> Self {
        Self {
            event,
            timestamp: Utc::now().to_rfc3339(),
            source: source.into(),
        }
    }

    /// 序列化为传输字节
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
