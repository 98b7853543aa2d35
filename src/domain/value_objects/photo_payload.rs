use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// インライン添付される検査写真。base64文字列として保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoPayload(String);

/// デコード後サイズの上限（2 MiB）
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

impl PhotoPayload {
    pub fn new(encoded: String) -> Result<Self, String> {
        let decoded = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| format!("Invalid base64 photo payload: {e}"))?;
        if decoded.is_empty() {
            return Err("Photo payload cannot be empty".to_string());
        }
        if decoded.len() > MAX_PHOTO_BYTES {
            return Err(format!(
                "Photo payload exceeds {} bytes (got {})",
                MAX_PHOTO_BYTES,
                decoded.len()
            ));
        }
        Ok(Self(encoded))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.is_empty() {
            return Err("Photo payload cannot be empty".to_string());
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(format!(
                "Photo payload exceeds {} bytes (got {})",
                MAX_PHOTO_BYTES,
                bytes.len()
            ));
        }
        Ok(Self(STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<PhotoPayload> for String {
    fn from(payload: PhotoPayload) -> Self {
        payload.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_roundtrips_base64() {
        let payload = PhotoPayload::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        assert_eq!(PhotoPayload::new(payload.as_str().to_string()), Ok(payload));
    }

    #[test]
    fn test_rejects_invalid_and_oversized() {
        assert!(PhotoPayload::new("not valid base64!!".to_string()).is_err());
        assert!(PhotoPayload::from_bytes(&[]).is_err());
        let oversized = vec![0u8; MAX_PHOTO_BYTES + 1];
        assert!(PhotoPayload::from_bytes(&oversized).is_err());
    }
}
