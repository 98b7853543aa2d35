use serde::{Deserialize, Serialize};
use std::fmt;

/// オフライン検査レコードのライフサイクル状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Syncing,
    Synced,
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Syncing => "syncing",
            RecordStatus::Synced => "synced",
            RecordStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(RecordStatus::Pending),
            "syncing" => Ok(RecordStatus::Syncing),
            "synced" => Ok(RecordStatus::Synced),
            "error" => Ok(RecordStatus::Error),
            other => Err(format!("Unknown record status '{other}'")),
        }
    }

    /// synced のみ終端。error は再試行対象として残る。
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Synced)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
