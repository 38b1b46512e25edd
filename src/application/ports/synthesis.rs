//! Synthesis Port - 语音合成引擎抽象
//!
//! 无状态适配器：一次出站调用、一次响应，不重试、不缓存。
//! 所有可靠性策略都在 SampleCache 里，这个薄网络层因此可以用
//! Fake 轻松测试。

use async_trait::async_trait;
use thiserror::Error;

/// 合成错误
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited by synthesis backend")]
    RateLimited,

    #[error("Input too large: {0}")]
    InputTooLarge(String),

    #[error("Service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 音色塑形参数（0-1 浮点旋钮）
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
        }
    }
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 音色 ID
    pub voice_id: String,
    /// 要合成的文本
    pub text: String,
    /// 模型标识
    pub model_id: String,
    /// 音色塑形参数
    pub settings: VoiceSettings,
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// 原始音频字节 (audio/mpeg)
    pub audio_data: Vec<u8>,
    pub content_type: String,
}

/// Synthesis Port
///
/// 外部语音合成服务的抽象接口
#[async_trait]
pub trait SynthesisPort: Send + Sync {
    /// 执行一次合成调用
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, SynthesisError>;

    /// 检查合成服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
