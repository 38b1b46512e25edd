//! Blob Store Port - 内容寻址对象存储抽象
//!
//! 包装外部对象存储服务。写入按幂等处理：对同一 key 重放相同字节
//! 安全且廉价，部分失败后的重试写入不会构成正确性风险。

use async_trait::async_trait;
use thiserror::Error;

/// 对象存储错误
#[derive(Debug, Clone, Error)]
pub enum BlobStoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected status: HTTP {status}")]
    UnexpectedStatus { status: u16 },
}

/// Blob Store Port
///
/// key 是相对路径（由 CacheKey 派生），适配器负责加命名空间前缀。
/// `exists` 同时充当可达性探测：对象被外部存储回收后必须读成 miss，
/// 而不是把失效链接交给调用方。
#[async_trait]
pub trait BlobStorePort: Send + Sync {
    /// 写入对象，返回可公开解析的 URL
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobStoreError>;

    /// 对象是否存在且可达
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError>;

    /// 获取对象的公开 URL
    async fn get(&self, key: &str) -> Result<String, BlobStoreError>;
}
