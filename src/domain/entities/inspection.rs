use crate::domain::value_objects::{LocalId, PhotoPayload, RecordStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ローカルで作成され、まだサーバ確定していない検査レコード。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfflineInspectionRecord {
    pub local_id: LocalId,
    pub model_id: String,
    pub process_id: String,
    pub defect_type_id: Option<String>,
    pub machine_id: Option<String>,
    pub inspector_id: String,
    pub inspector_name: String,
    pub inspected_quantity: u32,
    pub defect_quantity: u32,
    pub photo: Option<PhotoPayload>,
    pub notes: Option<String>,
    pub status: RecordStatus,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl OfflineInspectionRecord {
    /// 再試行上限に達した error レコードは自動同期の対象外。
    pub fn is_retry_exhausted(&self, max_retry: u32) -> bool {
        self.status == RecordStatus::Error && self.retry_count >= max_retry
    }
}

/// 検査結果の投入時に使用するドラフト。数量の整合性はここで検証する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InspectionDraft {
    pub model_id: String,
    pub process_id: String,
    pub defect_type_id: Option<String>,
    pub machine_id: Option<String>,
    pub inspector_id: String,
    pub inspector_name: String,
    pub inspected_quantity: u32,
    pub defect_quantity: u32,
    pub photo: Option<PhotoPayload>,
    pub notes: Option<String>,
}

impl InspectionDraft {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model_id: String,
        process_id: String,
        defect_type_id: Option<String>,
        machine_id: Option<String>,
        inspector_id: String,
        inspector_name: String,
        inspected_quantity: u32,
        defect_quantity: u32,
        photo: Option<PhotoPayload>,
        notes: Option<String>,
    ) -> Result<Self, String> {
        if model_id.trim().is_empty() {
            return Err("Model id is required".to_string());
        }
        if process_id.trim().is_empty() {
            return Err("Process id is required".to_string());
        }
        if inspector_id.trim().is_empty() {
            return Err("Inspector id is required".to_string());
        }
        if inspected_quantity == 0 {
            return Err("Inspected quantity must be positive".to_string());
        }
        if defect_quantity > inspected_quantity {
            return Err(format!(
                "Defect quantity {defect_quantity} exceeds inspected quantity {inspected_quantity}"
            ));
        }
        Ok(Self {
            model_id,
            process_id,
            defect_type_id,
            machine_id,
            inspector_id,
            inspector_name,
            inspected_quantity,
            defect_quantity,
            photo,
            notes,
        })
    }
}
