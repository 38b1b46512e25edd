//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXGATE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXGATE_SYNTHESIS__API_KEY=sk-...`
/// - `VOXGATE_SYNTHESIS__URL=https://api.elevenlabs.io`
/// - `VOXGATE_STORAGE__ENDPOINT=http://minio:9000`
/// - `VOXGATE_WEBHOOK__MAX_ATTEMPTS=5`
/// - `VOXGATE_DATABASE__PATH=/data/voxgate.db`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("synthesis.url", "https://api.elevenlabs.io")?
        .set_default("synthesis.api_key", "")?
        .set_default("synthesis.model_id", "eleven_multilingual_v2")?
        .set_default("synthesis.timeout_secs", 30)?
        .set_default("synthesis.max_text_len", 2500)?
        .set_default("storage.endpoint", "http://localhost:9000")?
        .set_default("storage.bucket", "voxgate")?
        .set_default("storage.key_prefix", "samples")?
        .set_default("storage.timeout_secs", 15)?
        .set_default("webhook.max_attempts", 3)?
        .set_default("webhook.base_delay_secs", 1)?
        .set_default("webhook.worker_limit", 8)?
        .set_default("webhook.source", "voxgate")?
        .set_default("webhook.request_timeout_secs", 10)?
        .set_default("database.path", "data/voxgate.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: VOXGATE_
    // 层级分隔符: __ (双下划线)
    // 例如: VOXGATE_SYNTHESIS__API_KEY=sk-...
    builder = builder.add_source(
        Environment::with_prefix("VOXGATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.synthesis.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Synthesis URL cannot be empty".to_string(),
        ));
    }

    if config.synthesis.max_text_len == 0 {
        return Err(ConfigError::ValidationError(
            "Synthesis max_text_len cannot be 0".to_string(),
        ));
    }

    if config.storage.endpoint.is_empty() {
        return Err(ConfigError::ValidationError(
            "Storage endpoint cannot be empty".to_string(),
        ));
    }

    if config.webhook.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "Webhook max_attempts cannot be 0".to_string(),
        ));
    }

    if config.webhook.worker_limit == 0 {
        return Err(ConfigError::ValidationError(
            "Webhook worker_limit cannot be 0".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Synthesis URL: {}", config.synthesis.url);
    tracing::info!("Synthesis Model: {}", config.synthesis.model_id);
    tracing::info!("Synthesis Timeout: {}s", config.synthesis.timeout_secs);
    tracing::info!(
        "Synthesis API Key: {}",
        if config.synthesis.api_key.is_empty() {
            "(not set)"
        } else {
            "(set)"
        }
    );
    tracing::info!("Storage Endpoint: {}", config.storage.endpoint);
    tracing::info!("Storage Bucket: {}", config.storage.bucket);
    tracing::info!("Webhook Max Attempts: {}", config.webhook.max_attempts);
    tracing::info!("Webhook Base Delay: {}s", config.webhook.base_delay_secs);
    tracing::info!("Webhook Worker Limit: {}", config.webhook.worker_limit);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_synthesis_url() {
        let mut config = AppConfig::default();
        config.synthesis.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_max_attempts() {
        let mut config = AppConfig::default();
        config.webhook.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_worker_limit() {
        let mut config = AppConfig::default();
        config.webhook.worker_limit = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_db_path() {
        let mut config = AppConfig::default();
        config.database.path = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[synthesis]
model_id = "eleven_turbo_v2"

[webhook]
max_attempts = 5
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.synthesis.model_id, "eleven_turbo_v2");
        assert_eq!(config.webhook.max_attempts, 5);
        // 未覆盖的字段落回默认值
        assert_eq!(config.webhook.worker_limit, 8);
    }
}
