//! Sample Cache - 单航道取或生成服务
//!
//! 把计费、限流的语音合成后端变成"一次生成、永久存储、命中直接返回"：
//! 先查对象存储，命中返回 URL；未命中才调用合成服务并写入存储。
//!
//! 单航道（single-flight）不变量：同一个 key 任何时刻至多一个生成调用
//! 在途，并发调用者共享这一次的结果（成功或失败），绝不触发 N 次计费。
//! 锁是进程内的；多副本部署时退化为"每进程单航道"。
//!
//! 失败不做负缓存：生成失败后紧接着的下一次调用会重新发起生成。

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;

use crate::application::error::SampleCacheError;
use crate::application::ports::{BlobStorePort, SynthesisPort, SynthesisRequest, VoiceSettings};
use crate::domain::{CacheKey, SAMPLE_CONTENT_TYPE};

/// 在途生成的共享句柄；等待者克隆后各自 await
type InFlightFuture = Shared<BoxFuture<'static, Result<String, SampleCacheError>>>;

/// 样本缓存配置
#[derive(Debug, Clone)]
pub struct SampleCacheConfig {
    /// 合成模型标识
    pub model_id: String,
    /// 默认音色塑形参数
    pub settings: VoiceSettings,
    /// 文本长度上限（字符数），超出直接拒绝，不花网络调用
    pub max_text_len: usize,
    /// 单次合成调用的超时；挂死的后端不能无限占住 key
    pub synthesis_timeout: Duration,
}

impl Default for SampleCacheConfig {
    fn default() -> Self {
        Self {
            model_id: "eleven_multilingual_v2".to_string(),
            settings: VoiceSettings::default(),
            max_text_len: 2500,
            synthesis_timeout: Duration::from_secs(30),
        }
    }
}

/// 样本缓存
pub struct SampleCache {
    synthesis: Arc<dyn SynthesisPort>,
    blob_store: Arc<dyn BlobStorePort>,
    config: SampleCacheConfig,
    in_flight: Arc<DashMap<String, InFlightFuture>>,
}

impl SampleCache {
    pub fn new(
        synthesis: Arc<dyn SynthesisPort>,
        blob_store: Arc<dyn BlobStorePort>,
        config: SampleCacheConfig,
    ) -> Self {
        Self {
            synthesis,
            blob_store,
            config,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 取或生成 (voice_id, text) 的样本，返回可公开解析的 URL
    ///
    /// 命中：零写入、零合成调用。未命中：一次合成 + 一次存储写入。
    /// 生成失败原样返回类型化错误，由调用方决定是否重试。
    pub async fn get_or_create(
        &self,
        voice_id: &str,
        text: &str,
    ) -> Result<String, SampleCacheError> {
        if voice_id.trim().is_empty() {
            return Err(SampleCacheError::InvalidInput(
                "voice_id must not be empty".to_string(),
            ));
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SampleCacheError::InvalidInput(
                "text must not be empty".to_string(),
            ));
        }
        let char_count = trimmed.chars().count();
        if char_count > self.config.max_text_len {
            return Err(SampleCacheError::InputTooLarge(format!(
                "{} chars exceeds limit of {}",
                char_count, self.config.max_text_len
            )));
        }

        let key = CacheKey::new(voice_id, text);
        let object_key = key.object_key();

        // 命中路径；exists 同时充当可达性探测，被外部存储回收的对象
        // 读成 miss，而不是把失效链接交给调用方
        match self.blob_store.exists(&object_key).await {
            Ok(true) => {
                tracing::debug!(key = %key, "Sample cache hit");
                return self
                    .blob_store
                    .get(&object_key)
                    .await
                    .map_err(|e| SampleCacheError::StorageUnreachable(e.to_string()));
            }
            Ok(false) => {}
            Err(e) => {
                return Err(SampleCacheError::StorageUnreachable(e.to_string()));
            }
        }

        tracing::debug!(key = %key, "Sample cache miss");
        self.join_or_start(key, voice_id, trimmed).await
    }

    /// 加入同 key 的在途生成，或者成为领导者发起生成
    ///
    /// 生成跑在独立的 spawn 任务里：等待者被取消不会取消生成本身，
    /// 其他等待者可能还需要这个结果。
    fn join_or_start(&self, key: CacheKey, voice_id: &str, text: &str) -> InFlightFuture {
        let map_key = key.object_key();

        match self.in_flight.entry(map_key.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let synthesis = self.synthesis.clone();
                let blob_store = self.blob_store.clone();
                let config = self.config.clone();
                let in_flight = self.in_flight.clone();
                let request = SynthesisRequest {
                    voice_id: voice_id.to_string(),
                    text: text.to_string(),
                    model_id: config.model_id.clone(),
                    settings: config.settings,
                };

                let task = tokio::spawn(async move {
                    let result =
                        generate_and_store(synthesis, blob_store, &config, &key, request).await;
                    // 结果对外可见之前先移除在途条目，后续调用不会拿到陈旧的错误
                    in_flight.remove(&map_key);
                    result
                });

                let fut: InFlightFuture = async move {
                    match task.await {
                        Ok(result) => result,
                        Err(e) => Err(SampleCacheError::Internal(format!(
                            "generation task failed: {}",
                            e
                        ))),
                    }
                }
                .boxed()
                .shared();

                entry.insert(fut.clone());
                fut
            }
        }
    }
}

/// 领导者执行：再查一次、合成、写入
async fn generate_and_store(
    synthesis: Arc<dyn SynthesisPort>,
    blob_store: Arc<dyn BlobStorePort>,
    config: &SampleCacheConfig,
    key: &CacheKey,
    request: SynthesisRequest,
) -> Result<String, SampleCacheError> {
    let object_key = key.object_key();

    // 拿到领导权后再查一次：竞争者可能在我们入队之前刚完成写入
    if let Ok(true) = blob_store.exists(&object_key).await {
        tracing::debug!(key = %key, "Sample appeared while waiting for flight slot");
        return blob_store
            .get(&object_key)
            .await
            .map_err(|e| SampleCacheError::StorageUnreachable(e.to_string()));
    }

    let audio = match tokio::time::timeout(config.synthesis_timeout, synthesis.synthesize(request))
        .await
    {
        Ok(Ok(audio)) => audio,
        Ok(Err(e)) => {
            tracing::warn!(key = %key, error = %e, "Synthesis failed");
            return Err(e.into());
        }
        Err(_) => {
            tracing::warn!(
                key = %key,
                timeout_secs = config.synthesis_timeout.as_secs(),
                "Synthesis call timed out"
            );
            return Err(SampleCacheError::ExternalServiceUnavailable(
                "synthesis call timed out".to_string(),
            ));
        }
    };

    match blob_store
        .put(&object_key, audio.audio_data, SAMPLE_CONTENT_TYPE)
        .await
    {
        Ok(url) => {
            tracing::info!(key = %key, url = %url, "Sample generated and cached");
            Ok(url)
        }
        Err(e) => {
            // 计费调用已经发生但结果没存下来：这是浪费掉的外部开销，
            // 单独打标记方便运维告警
            tracing::error!(
                key = %key,
                error = %e,
                wasted_spend = true,
                "Storage write failed after billable synthesis"
            );
            Err(SampleCacheError::StorageWriteFailed(e.to_string()))
        }
    }
}
