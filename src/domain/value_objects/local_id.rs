use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// サーバ発行IDと衝突しないよう接頭辞付きで採番するローカルID。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalId(String);

const LOCAL_ID_PREFIX: &str = "local-";

impl LocalId {
    /// 生成規則: `local-<unixミリ秒>-<uuid先頭8桁>`
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}{}-{}",
            LOCAL_ID_PREFIX,
            Utc::now().timestamp_millis(),
            &suffix[..8]
        ))
    }

    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Local id cannot be empty".to_string());
        }
        if !value.starts_with(LOCAL_ID_PREFIX) {
            return Err(format!(
                "Local id must start with '{LOCAL_ID_PREFIX}', got '{value}'"
            ));
        }
        Ok(())
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<LocalId> for String {
    fn from(id: LocalId) -> Self {
        id.0
    }
}
