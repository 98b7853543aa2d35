use sqlx::FromRow;

/// `offline_inspections` テーブルの生の行。
#[derive(Debug, Clone, FromRow)]
pub struct OfflineInspectionRow {
    pub local_id: String,
    pub model_id: String,
    pub process_id: String,
    pub defect_type_id: Option<String>,
    pub machine_id: Option<String>,
    pub inspector_id: String,
    pub inspector_name: String,
    pub inspected_quantity: i64,
    pub defect_quantity: i64,
    pub photo_base64: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub retry_count: i64,
    pub created_at: i64,
    pub synced_at: Option<i64>,
    pub error_message: Option<String>,
}

/// コード付きリファレンステーブル（models / processes / defect_types / machines）共通の行。
#[derive(Debug, Clone, FromRow)]
pub struct ReferenceRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub is_active: i64,
    pub cached_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub role: String,
    pub is_active: i64,
    pub cached_at: i64,
}
