//! Signature Signer - 出站报文的 HMAC-SHA256 签名
//!
//! 纯函数、确定性。签名必须对实际传输的那份字节计算——
//! 不能对重新序列化的副本签名，否则接收端校验会非确定性地失败。
//! 接收端对原始 body 重算并做常数时间比对。

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 出站请求携带签名的 header 名
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// 签名格式前缀
const SIGNATURE_PREFIX: &str = "sha256=";

/// 计算签名：`sha256=<hex(hmac_sha256(secret, payload))>`
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// 校验签名（常数时间比对）
pub fn verify(payload: &[u8], secret: &str, signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let payload = br#"{"event":"book.created","data":{}}"#;
        let signature = sign(payload, "s3cret");
        assert!(signature.starts_with("sha256="));
        assert!(verify(payload, "s3cret", &signature));
    }

    #[test]
    fn test_sign_is_deterministic() {
        let payload = b"payload";
        assert_eq!(sign(payload, "k"), sign(payload, "k"));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let signature = sign(b"payload", "s3cret");
        assert!(!verify(b"paylaod", "s3cret", &signature));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let signature = sign(b"payload", "s3cret");
        assert!(!verify(b"payload", "other", &signature));
    }

    #[test]
    fn test_malformed_signature_fails() {
        assert!(!verify(b"payload", "s3cret", "md5=abc"));
        assert!(!verify(b"payload", "s3cret", "sha256=not-hex"));
    }
}
