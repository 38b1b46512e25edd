//! Webhook Subscription - 订阅定义
//!
//! 订阅由站点的后台 CRUD 流程创建和编辑（不在本层范围内），
//! 分发器只读取。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Webhook 订阅
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub name: String,
    /// 投递目标 URL
    pub url: String,
    /// 订阅的事件类型集合
    pub event_types: HashSet<String>,
    /// 可选签名密钥；存在时出站请求携带 X-Signature 头
    pub secret: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        event_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            event_types: event_types.into_iter().map(Into::into).collect(),
            secret: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// 设置签名密钥
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// 停用订阅
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// 是否应当接收该事件类型
    pub fn matches(&self, event_type: &str) -> bool {
        self.active && self.event_types.contains(event_type)
    }
}
