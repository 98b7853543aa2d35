use crate::domain::entities::{
    DefectType, InspectionProcess, Machine, OfflineInspectionRecord, ProductModel, UserAccount,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// リモートストアへの呼び出しが返すエラー。
/// 再試行すべきかどうかの判断はここで決まり、同期エンジンは
/// その判断に従って再試行カウンタを進める。
#[derive(Debug, Error)]
pub enum RemoteError {
    /// 恒久的な検証エラー。再送しても通らない。
    #[error("validation rejected: {0}")]
    Validation(String),
    /// ネットワーク到達性の問題。再試行対象。
    #[error("network failure: {0}")]
    Network(String),
    /// サーバ側エラー。再試行対象。
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
}

impl RemoteError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RemoteError::Validation(_))
    }
}

/// リモート作成呼び出しのペイロード。ローカル簿記フィールドは含まない。
/// `client_reference` にローカルIDを載せ、サーバ側の重複排除に使う。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInspection {
    pub model_id: String,
    pub process_id: String,
    pub defect_type_id: Option<String>,
    pub machine_id: Option<String>,
    pub inspector_id: String,
    pub inspector_name: String,
    pub inspected_quantity: u32,
    pub defect_quantity: u32,
    pub photo_base64: Option<String>,
    pub notes: Option<String>,
    pub client_reference: String,
}

impl NewInspection {
    pub fn from_record(record: &OfflineInspectionRecord) -> Self {
        Self {
            model_id: record.model_id.clone(),
            process_id: record.process_id.clone(),
            defect_type_id: record.defect_type_id.clone(),
            machine_id: record.machine_id.clone(),
            inspector_id: record.inspector_id.clone(),
            inspector_name: record.inspector_name.clone(),
            inspected_quantity: record.inspected_quantity,
            defect_quantity: record.defect_quantity,
            photo_base64: record.photo.as_ref().map(|p| p.as_str().to_string()),
            notes: record.notes.clone(),
            client_reference: record.local_id.to_string(),
        }
    }
}

/// リモートストアの論理操作。トランスポートの実装はアダプタ側。
#[async_trait]
pub trait InspectionApi: Send + Sync {
    /// 検査レコードを作成し、サーバ発行IDを返す。
    async fn create_inspection(&self, new: &NewInspection) -> Result<String, RemoteError>;

    async fn fetch_product_models(&self) -> Result<Vec<ProductModel>, RemoteError>;
    async fn fetch_inspection_processes(&self) -> Result<Vec<InspectionProcess>, RemoteError>;
    async fn fetch_defect_types(&self) -> Result<Vec<DefectType>, RemoteError>;
    async fn fetch_machines(&self) -> Result<Vec<Machine>, RemoteError>;
    async fn fetch_users(&self) -> Result<Vec<UserAccount>, RemoteError>;
}
