//! Fake Synthesis Client - 用于测试的合成客户端
//!
//! 返回固定的音频字节，不实际调用合成服务。
//! 带调用计数和可编排的失败队列，用来验证缓存层的可靠性策略。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{
    SynthesisError, SynthesisPort, SynthesisRequest, SynthesizedAudio,
};
use crate::domain::SAMPLE_CONTENT_TYPE;

/// Fake Synthesis Client
pub struct FakeSynthesisClient {
    /// 固定返回的音频字节
    audio_data: Vec<u8>,
    /// 模拟的推理延迟
    delay: Duration,
    /// 按调用顺序弹出的预编排失败
    scripted_failures: Mutex<VecDeque<SynthesisError>>,
    call_count: AtomicUsize,
}

impl FakeSynthesisClient {
    pub fn new(audio_data: Vec<u8>) -> Self {
        Self {
            audio_data,
            delay: Duration::ZERO,
            scripted_failures: Mutex::new(VecDeque::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 编排一次失败；多次调用按顺序弹出
    pub fn fail_next(self, error: SynthesisError) -> Self {
        self.scripted_failures
            .lock()
            .expect("scripted_failures lock")
            .push_back(error);
        self
    }

    /// 实际发生的合成调用次数
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SynthesisPort for FakeSynthesisClient {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            voice_id = %request.voice_id,
            text_len = request.text.len(),
            "FakeSynthesisClient: synthesize called"
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self
            .scripted_failures
            .lock()
            .expect("scripted_failures lock")
            .pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }

        Ok(SynthesizedAudio {
            audio_data: self.audio_data.clone(),
            content_type: SAMPLE_CONTENT_TYPE.to_string(),
        })
    }
}
