//! 基础设施层
//!
//! 端口的具体实现：外部服务适配器、持久化、Webhook 分发

pub mod adapters;
pub mod persistence;
pub mod webhook;
