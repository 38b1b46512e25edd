//! 应用层错误定义
//!
//! SampleCache 对外的统一错误类型。派生 Clone 是有意的：
//! 单航道生成的一次失败要原样扇出给所有等待者。

use thiserror::Error;

use crate::application::ports::SynthesisError;

/// 样本缓存错误
#[derive(Debug, Clone, Error)]
pub enum SampleCacheError {
    /// 输入校验失败（空 voice_id / 空文本）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 文本超过合成后端的长度上限
    #[error("Input too large: {0}")]
    InputTooLarge(String),

    /// 合成后端不可用（宕机/限流/超时）——调用方可重试，本层不重试
    #[error("External service unavailable: {0}")]
    ExternalServiceUnavailable(String),

    /// 生成成功但持久化失败——计费工作已经发生，单独记录
    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    /// 对象存储不可达
    #[error("Storage unreachable: {0}")]
    StorageUnreachable(String),

    /// 内部错误（生成任务 panic 等）
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SynthesisError> for SampleCacheError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::InputTooLarge(msg) => SampleCacheError::InputTooLarge(msg),
            other => SampleCacheError::ExternalServiceUnavailable(other.to_string()),
        }
    }
}
