//! Webhook Transport - 出站 HTTP POST
//!
//! 传输是端口：真实实现走 reqwest，测试用可录制的 Fake。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use super::signer::SIGNATURE_HEADER;

/// 传输错误（一次尝试的失败，重试策略在分发器）
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),
}

/// Webhook Transport Port
#[async_trait]
pub trait WebhookTransportPort: Send + Sync {
    /// POST JSON 字节到目标 URL，返回 HTTP 状态码
    ///
    /// body 就是被签名的那份字节，原样发送
    async fn post_json(
        &self,
        url: &str,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<u16, TransportError>;
}

/// reqwest 实现
pub struct HttpWebhookTransport {
    client: Client,
}

impl HttpWebhookTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransportPort for HttpWebhookTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<u16, TransportError> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_vec());

        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        Ok(response.status().as_u16())
    }
}
