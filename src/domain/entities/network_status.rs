use crate::domain::entities::sync_report::SyncReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UIクロームに出す接続・同期状態のスナップショット。
/// ローカルストアと接続シグナルから毎回再計算され、永続化はしない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkStatusSnapshot {
    pub is_online: bool,
    pub pending_count: u64,
    pub is_syncing: bool,
    pub last_report: Option<SyncReport>,
    pub last_synced_at: Option<DateTime<Utc>>,
}
