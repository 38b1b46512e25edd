//! Webhook 分发
//!
//! 分发器、HMAC 签名、HTTP 传输

pub mod dispatcher;
pub mod signer;
pub mod transport;

pub use dispatcher::{WebhookDispatcher, WebhookDispatcherConfig};
pub use transport::{HttpWebhookTransport, TransportError, WebhookTransportPort};
