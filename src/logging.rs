//! 日志初始化
//!
//! 宿主进程（站点二进制）在启动时调用一次；重复调用返回错误而不是 panic。

use crate::config::LogConfig;

/// 按配置初始化全局 tracing 订阅者
///
/// `RUST_LOG` 环境变量优先于配置文件中的级别。
pub fn init_tracing(config: &LogConfig) -> Result<(), String> {
    let log_filter = format!("{},voxgate={}", config.level, config.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| format!("Failed to initialize tracing: {}", e))
}
