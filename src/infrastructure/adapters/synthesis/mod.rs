//! 语音合成适配器

mod fake_synthesis_client;
mod http_synthesis_client;

pub use fake_synthesis_client::FakeSynthesisClient;
pub use http_synthesis_client::{HttpSynthesisClient, HttpSynthesisClientConfig};
