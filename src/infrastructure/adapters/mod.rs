//! 外部服务适配器

pub mod storage;
pub mod synthesis;

pub use storage::{HttpBlobStore, HttpBlobStoreConfig, MemoryBlobStore};
pub use synthesis::{FakeSynthesisClient, HttpSynthesisClient, HttpSynthesisClientConfig};
