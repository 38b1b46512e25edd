//! Memory Blob Store - 内存对象存储
//!
//! 用于测试和嵌入场景。可注入写失败、可模拟外部回收。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::{BlobStoreError, BlobStorePort};

/// 内存对象存储
pub struct MemoryBlobStore {
    objects: DashMap<String, (Vec<u8>, String)>,
    base_url: String,
    fail_puts: AtomicBool,
    put_count: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            base_url: "memory://samples".to_string(),
            fail_puts: AtomicBool::new(false),
            put_count: AtomicUsize::new(0),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// 注入写失败
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// 实际发生的写入次数
    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    /// 模拟外部存储回收对象
    pub fn evict(&self, key: &str) {
        self.objects.remove(key);
    }

    /// 读取对象字节（测试断言用）
    pub fn object_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.get(key).map(|entry| entry.0.clone())
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStorePort for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobStoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(BlobStoreError::UnexpectedStatus { status: 500 });
        }

        self.objects
            .insert(key.to_string(), (bytes, content_type.to_string()));
        self.put_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.url(key))
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        Ok(self.objects.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<String, BlobStoreError> {
        if self.objects.contains_key(key) {
            Ok(self.url(key))
        } else {
            Err(BlobStoreError::NotFound(key.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_exists_and_get() {
        let store = MemoryBlobStore::new();

        let url = store
            .put("voice-A/abc.mp3", vec![1, 2, 3], "audio/mpeg")
            .await
            .unwrap();
        assert_eq!(url, "memory://samples/voice-A/abc.mp3");
        assert!(store.exists("voice-A/abc.mp3").await.unwrap());
        assert_eq!(store.get("voice-A/abc.mp3").await.unwrap(), url);
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let store = MemoryBlobStore::new();
        let bytes = vec![9, 9, 9];

        let first = store.put("k.mp3", bytes.clone(), "audio/mpeg").await.unwrap();
        let second = store.put("k.mp3", bytes.clone(), "audio/mpeg").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.object_bytes("k.mp3").unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let store = MemoryBlobStore::new();
        assert!(!store.exists("nope.mp3").await.unwrap());
        assert!(matches!(
            store.get("nope.mp3").await,
            Err(BlobStoreError::NotFound(_))
        ));
    }
}
