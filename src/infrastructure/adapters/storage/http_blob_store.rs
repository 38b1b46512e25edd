//! HTTP Blob Store - 对象存储 HTTP 客户端
//!
//! 实现 BlobStorePort trait，对 S3 兼容的对象存储服务做
//! PUT / HEAD 操作。key 统一挂在稳定的命名空间前缀下，
//! 写入幂等：对同一路径重放相同字节安全且廉价。

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{BlobStoreError, BlobStorePort};

/// HTTP 对象存储配置
#[derive(Debug, Clone)]
pub struct HttpBlobStoreConfig {
    /// 存储服务端点（PUT 目标）
    pub endpoint: String,
    /// 桶名
    pub bucket: String,
    /// 对外可解析的基础 URL；未设置时用 endpoint
    pub public_base_url: Option<String>,
    /// 鉴权 token（Bearer）
    pub api_key: Option<String>,
    /// key 命名空间前缀
    pub key_prefix: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpBlobStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            bucket: "voxgate".to_string(),
            public_base_url: None,
            api_key: None,
            key_prefix: "samples".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpBlobStoreConfig {
    /// 对象的存储路径（挂前缀）
    pub fn object_path(&self, key: &str) -> String {
        format!("{}/{}/{}", self.bucket, self.key_prefix, key)
    }

    /// 对象的公开 URL
    pub fn public_url(&self, key: &str) -> String {
        let base = self.public_base_url.as_deref().unwrap_or(&self.endpoint);
        format!("{}/{}", base, self.object_path(key))
    }

    /// 对象的上传 URL
    pub fn upload_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, self.object_path(key))
    }
}

/// HTTP 对象存储
pub struct HttpBlobStore {
    client: Client,
    config: HttpBlobStoreConfig,
}

impl HttpBlobStore {
    pub fn new(config: HttpBlobStoreConfig) -> Result<Self, BlobStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BlobStoreError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn map_send_error(e: reqwest::Error) -> BlobStoreError {
        if e.is_timeout() {
            BlobStoreError::Timeout
        } else {
            BlobStoreError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl BlobStorePort for HttpBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobStoreError> {
        let url = self.config.upload_url(key);
        let size = bytes.len();

        let mut request = self
            .client
            .put(&url)
            .header("Content-Type", content_type)
            .body(bytes);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlobStoreError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        tracing::info!(key = %key, size_bytes = size, "Object stored");
        Ok(self.config.public_url(key))
    }

    /// HEAD 公开 URL：既是存在性检查也是可达性探测。
    /// 被外部存储回收的对象在这里读成 miss。
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        let url = self.config.public_url(key);

        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Ok(response.status().is_success())
    }

    async fn get(&self, key: &str) -> Result<String, BlobStoreError> {
        Ok(self.config.public_url(key))
    }
}
