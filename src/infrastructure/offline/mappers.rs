use crate::domain::entities::{
    DefectType, InspectionProcess, Machine, OfflineInspectionRecord, ProductModel, UserAccount,
};
use crate::domain::value_objects::{LocalId, PhotoPayload, RecordStatus};
use crate::infrastructure::offline::rows::{OfflineInspectionRow, ReferenceRow, UserRow};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};

/// 行→ドメインの変換。保存済みデータの破損は Database エラーとして扱う。
pub fn inspection_from_row(row: OfflineInspectionRow) -> Result<OfflineInspectionRecord, AppError> {
    let local_id = LocalId::new(row.local_id).map_err(AppError::Database)?;
    let status = RecordStatus::parse(&row.status).map_err(AppError::Database)?;
    let photo = row
        .photo_base64
        .map(PhotoPayload::new)
        .transpose()
        .map_err(AppError::Database)?;

    Ok(OfflineInspectionRecord {
        local_id,
        model_id: row.model_id,
        process_id: row.process_id,
        defect_type_id: row.defect_type_id,
        machine_id: row.machine_id,
        inspector_id: row.inspector_id,
        inspector_name: row.inspector_name,
        inspected_quantity: quantity_from_column(row.inspected_quantity, "inspected_quantity")?,
        defect_quantity: quantity_from_column(row.defect_quantity, "defect_quantity")?,
        photo,
        notes: row.notes,
        status,
        retry_count: quantity_from_column(row.retry_count, "retry_count")?,
        created_at: datetime_from_unix(row.created_at)?,
        synced_at: row.synced_at.map(datetime_from_unix).transpose()?,
        error_message: row.error_message,
    })
}

pub fn product_model_from_row(row: ReferenceRow) -> Result<ProductModel, AppError> {
    Ok(ProductModel {
        id: row.id,
        code: row.code,
        name: row.name,
        is_active: row.is_active != 0,
        cached_at: datetime_from_unix(row.cached_at)?,
    })
}

pub fn inspection_process_from_row(row: ReferenceRow) -> Result<InspectionProcess, AppError> {
    Ok(InspectionProcess {
        id: row.id,
        code: row.code,
        name: row.name,
        is_active: row.is_active != 0,
        cached_at: datetime_from_unix(row.cached_at)?,
    })
}

pub fn defect_type_from_row(row: ReferenceRow) -> Result<DefectType, AppError> {
    Ok(DefectType {
        id: row.id,
        code: row.code,
        name: row.name,
        is_active: row.is_active != 0,
        cached_at: datetime_from_unix(row.cached_at)?,
    })
}

pub fn machine_from_row(row: ReferenceRow) -> Result<Machine, AppError> {
    Ok(Machine {
        id: row.id,
        code: row.code,
        name: row.name,
        is_active: row.is_active != 0,
        cached_at: datetime_from_unix(row.cached_at)?,
    })
}

pub fn user_from_row(row: UserRow) -> Result<UserAccount, AppError> {
    Ok(UserAccount {
        id: row.id,
        name: row.name,
        role: row.role,
        is_active: row.is_active != 0,
        cached_at: datetime_from_unix(row.cached_at)?,
    })
}

fn datetime_from_unix(secs: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Database(format!("Invalid timestamp {secs}")))
}

fn quantity_from_column(value: i64, column: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::Database(format!("Column {column} out of range: {value}")))
}
