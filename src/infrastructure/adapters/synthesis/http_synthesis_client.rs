//! HTTP Synthesis Client - 调用外部语音合成 HTTP 服务
//!
//! 实现 SynthesisPort trait，通过 HTTP 调用合成后端
//!
//! 外部合成 API:
//! POST {base_url}/v1/text-to-speech/{voice_id}
//! Header: xi-api-key
//! Request: {"text": "...", "model_id": "...", "voice_settings": {...}}  (JSON)
//! Response: audio/mpeg binary

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{
    SynthesisError, SynthesisPort, SynthesisRequest, SynthesizedAudio, VoiceSettings,
};
use crate::domain::SAMPLE_CONTENT_TYPE;

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SynthesisHttpRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// HTTP 合成客户端配置
#[derive(Debug, Clone)]
pub struct HttpSynthesisClientConfig {
    /// 合成服务基础 URL
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpSynthesisClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl HttpSynthesisClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 合成客户端
///
/// 一次出站调用、一次响应；重试/缓存策略都在 SampleCache
pub struct HttpSynthesisClient {
    client: Client,
    config: HttpSynthesisClientConfig,
}

impl HttpSynthesisClient {
    pub fn new(config: HttpSynthesisClientConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesize_url(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{}", self.config.base_url, voice_id)
    }

    fn health_url(&self) -> String {
        format!("{}/v1/user", self.config.base_url)
    }
}

#[async_trait]
impl SynthesisPort for HttpSynthesisClient {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let body = SynthesisHttpRequest {
            text: &request.text,
            model_id: &request.model_id,
            voice_settings: request.settings,
        };

        tracing::debug!(
            voice_id = %request.voice_id,
            text_len = request.text.len(),
            model_id = %request.model_id,
            "Sending synthesis request"
        );

        let response = self
            .client
            .post(self.synthesize_url(&request.voice_id))
            .header("xi-api-key", &self.config.api_key)
            .header("Accept", SAMPLE_CONTENT_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else if e.is_connect() {
                    SynthesisError::Network(format!("Cannot connect to synthesis service: {}", e))
                } else {
                    SynthesisError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => SynthesisError::RateLimited,
                413 => SynthesisError::InputTooLarge(message),
                code => SynthesisError::Service { status: code, message },
            });
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(SynthesisError::InvalidResponse(
                "empty audio body".to_string(),
            ));
        }

        tracing::info!(
            voice_id = %request.voice_id,
            audio_size = audio_data.len(),
            "Synthesis completed"
        );

        Ok(SynthesizedAudio {
            audio_data,
            content_type: SAMPLE_CONTENT_TYPE.to_string(),
        })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .header("xi-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
