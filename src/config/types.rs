//! Configuration Types
//!
//! 定义所有配置结构体

use std::time::Duration;

use serde::Deserialize;

use crate::application::sample_cache::SampleCacheConfig;
use crate::infrastructure::adapters::{HttpBlobStoreConfig, HttpSynthesisClientConfig};
use crate::infrastructure::persistence::sqlite;
use crate::infrastructure::webhook::WebhookDispatcherConfig;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 语音合成服务配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 对象存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// Webhook 分发配置
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            synthesis: SynthesisConfig::default(),
            storage: StorageConfig::default(),
            webhook: WebhookConfig::default(),
            database: DatabaseConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 语音合成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 合成服务基础 URL
    #[serde(default = "default_synthesis_url")]
    pub url: String,

    /// API key（计费凭证，通常由环境变量注入）
    #[serde(default)]
    pub api_key: String,

    /// 合成模型标识
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,

    /// 单次请求文本长度上限（字符数）
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
}

fn default_synthesis_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_synthesis_timeout() -> u64 {
    30
}

fn default_max_text_len() -> usize {
    2500
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            url: default_synthesis_url(),
            api_key: String::new(),
            model_id: default_model_id(),
            timeout_secs: default_synthesis_timeout(),
            max_text_len: default_max_text_len(),
        }
    }
}

impl SynthesisConfig {
    /// 转为 HTTP 客户端配置
    pub fn client_config(&self) -> HttpSynthesisClientConfig {
        HttpSynthesisClientConfig::new(self.url.clone(), self.api_key.clone())
            .with_timeout(self.timeout_secs)
    }

    /// 转为 SampleCache 配置
    pub fn cache_config(&self) -> SampleCacheConfig {
        SampleCacheConfig {
            model_id: self.model_id.clone(),
            max_text_len: self.max_text_len,
            synthesis_timeout: Duration::from_secs(self.timeout_secs),
            ..Default::default()
        }
    }
}

/// 对象存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 存储服务端点
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,

    /// 桶名
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// 对外可解析的基础 URL（CDN 等）；未设置时用 endpoint
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// 鉴权 token
    #[serde(default)]
    pub api_key: Option<String>,

    /// key 命名空间前缀
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

fn default_storage_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_bucket() -> String {
    "voxgate".to_string()
}

fn default_key_prefix() -> String {
    "samples".to_string()
}

fn default_storage_timeout() -> u64 {
    15
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_storage_endpoint(),
            bucket: default_bucket(),
            public_base_url: None,
            api_key: None,
            key_prefix: default_key_prefix(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

impl StorageConfig {
    /// 转为 HTTP Blob Store 配置
    pub fn blob_store_config(&self) -> HttpBlobStoreConfig {
        HttpBlobStoreConfig {
            endpoint: self.endpoint.clone(),
            bucket: self.bucket.clone(),
            public_base_url: self.public_base_url.clone(),
            api_key: self.api_key.clone(),
            key_prefix: self.key_prefix.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Webhook 分发配置
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// 每个订阅每个事件的最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 首次重试前的退避（秒）；之后每次翻倍
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,

    /// 并行投递的 worker 上限
    #[serde(default = "default_worker_limit")]
    pub worker_limit: usize,

    /// 出站报文的 source 字段
    #[serde(default = "default_source")]
    pub source: String,

    /// 单次出站 POST 超时时间（秒）
    #[serde(default = "default_webhook_timeout")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1
}

fn default_worker_limit() -> usize {
    8
}

fn default_source() -> String {
    "voxgate".to_string()
}

fn default_webhook_timeout() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
            worker_limit: default_worker_limit(),
            source: default_source(),
            request_timeout_secs: default_webhook_timeout(),
        }
    }
}

impl WebhookConfig {
    /// 转为分发器配置
    pub fn dispatcher_config(&self) -> WebhookDispatcherConfig {
        WebhookDispatcherConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_secs(self.base_delay_secs),
            worker_limit: self.worker_limit,
            source: self.source.clone(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/voxgate.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }

    /// 转为连接池配置
    pub fn pool_config(&self) -> sqlite::DatabaseConfig {
        sqlite::DatabaseConfig {
            database_url: self.database_url(),
            max_connections: self.max_connections,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
