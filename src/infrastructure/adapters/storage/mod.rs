//! 对象存储适配器

mod http_blob_store;
mod memory_blob_store;

pub use http_blob_store::{HttpBlobStore, HttpBlobStoreConfig};
pub use memory_blob_store::MemoryBlobStore;
