//! Cache Key & Cached Sample - 语音样本的内容寻址
//!
//! 缓存 key 由 (voice_id, 规范化文本的 md5 指纹) 确定性派生：
//! 相同的 (voice_id, text) 在任何进程、任何时刻都得到同一个 key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 样本音频的 MIME 类型
pub const SAMPLE_CONTENT_TYPE: &str = "audio/mpeg";

/// 缓存键
///
/// 由 voice_id + 规范化文本指纹派生，用于寻址对象存储中的样本。
/// 文本先做规范化（去首尾空白、折叠内部空白），再取 md5，
/// 因此仅空白差异的文本命中同一条缓存。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    voice_id: String,
    fingerprint: String,
}

impl CacheKey {
    /// 从 (voice_id, text) 派生缓存键
    pub fn new(voice_id: &str, text: &str) -> Self {
        let normalized = normalize_text(text);
        let digest = md5::compute(normalized.as_bytes());
        Self {
            voice_id: voice_id.to_string(),
            fingerprint: format!("{:x}", digest),
        }
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// 对象存储中的相对路径
    ///
    /// 存储适配器会再加上自己的命名空间前缀
    pub fn object_key(&self) -> String {
        format!("{}/{}.mp3", self.voice_id, self.fingerprint)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.voice_id, self.fingerprint)
    }
}

/// 已缓存的样本
///
/// 首次生成成功时创建；不可变、不更新、本子系统不删除
/// （保留策略是外部存储生命周期的事）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSample {
    pub key: String,
    pub object_url: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl CachedSample {
    pub fn new(key: &CacheKey, object_url: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            object_url: object_url.into(),
            content_type: SAMPLE_CONTENT_TYPE.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// 文本规范化：去首尾空白、把连续空白折叠成单个空格
fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = CacheKey::new("voice-A", "Hello world");
        let b = CacheKey::new("voice-A", "Hello world");
        assert_eq!(a, b);
        assert_eq!(a.object_key(), b.object_key());
    }

    #[test]
    fn test_key_normalizes_whitespace() {
        let a = CacheKey::new("voice-A", "  Hello   world \n");
        let b = CacheKey::new("voice-A", "Hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_text_distinct_key() {
        let a = CacheKey::new("voice-A", "Hello world");
        let b = CacheKey::new("voice-A", "Hello world!");
        assert_ne!(a, b);
    }

    #[test]
    fn test_distinct_voice_distinct_key() {
        let a = CacheKey::new("voice-A", "Hello world");
        let b = CacheKey::new("voice-B", "Hello world");
        assert_ne!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_object_key_layout() {
        let key = CacheKey::new("voice-A", "Hello world");
        let object_key = key.object_key();
        assert!(object_key.starts_with("voice-A/"));
        assert!(object_key.ends_with(".mp3"));
    }
}
