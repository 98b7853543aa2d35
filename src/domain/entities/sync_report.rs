use serde::{Deserialize, Serialize};

/// 1回の同期パスの結果。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncReport {
    pub success: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl SyncReport {
    /// オフライン時は一切試行せずにこれを返す。
    pub fn offline() -> Self {
        Self {
            success: 0,
            failed: 0,
            errors: vec!["offline".to_string()],
        }
    }

    /// 別のパスが実行中だった場合の応答。
    pub fn already_running() -> Self {
        Self {
            success: 0,
            failed: 0,
            errors: vec!["sync already in progress".to_string()],
        }
    }

    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(&mut self, message: String) {
        self.failed += 1;
        self.errors.push(message);
    }

    pub fn attempted(&self) -> u32 {
        self.success + self.failed
    }
}

/// リファレンスデータ更新の結果。テーブル単位で成否を報告する。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceRefreshReport {
    pub refreshed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ReferenceRefreshReport {
    pub fn record_refreshed(&mut self, table: &str) {
        self.refreshed.push(table.to_string());
    }

    pub fn record_failed(&mut self, table: &str, error: String) {
        self.failed.push((table.to_string(), error));
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
