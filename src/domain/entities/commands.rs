use crate::domain::value_objects::RecordStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 再試行カウンタへの作用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryEffect {
    /// 変更しない
    Keep,
    /// 1回分消費する
    Increment,
    /// 上限まで使い切る（恒久的な検証エラー向け）
    Exhaust,
}

/// レコードのステータス遷移コマンド。
///
/// コンストラクタ経由でのみ生成できるため、
/// 「synced には synced_at が伴う」「error には error_message が伴う」
/// という不変条件が型の上で保証される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordStatusChange {
    status: RecordStatus,
    synced_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    retry_effect: RetryEffect,
}

impl RecordStatusChange {
    /// 同期パスがレコードを掴んだ時点の遷移。
    pub fn syncing() -> Self {
        Self {
            status: RecordStatus::Syncing,
            synced_at: None,
            error_message: None,
            retry_effect: RetryEffect::Keep,
        }
    }

    /// リモート受理確定。エラーメッセージはクリアされる。
    pub fn synced(at: DateTime<Utc>) -> Self {
        Self {
            status: RecordStatus::Synced,
            synced_at: Some(at),
            error_message: None,
            retry_effect: RetryEffect::Keep,
        }
    }

    /// 一時的な失敗。再試行を1回分消費する。
    pub fn failed(message: String) -> Self {
        Self {
            status: RecordStatus::Error,
            synced_at: None,
            error_message: Some(message),
            retry_effect: RetryEffect::Increment,
        }
    }

    /// 恒久的な検証エラー。再試行上限まで使い切り、自動再送から外す。
    pub fn rejected(message: String) -> Self {
        Self {
            status: RecordStatus::Error,
            synced_at: None,
            error_message: Some(message),
            retry_effect: RetryEffect::Exhaust,
        }
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn retry_effect(&self) -> RetryEffect {
        self.retry_effect
    }
}
