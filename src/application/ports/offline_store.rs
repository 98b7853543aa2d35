use crate::domain::entities::{
    DefectType, InspectionDraft, InspectionProcess, Machine, OfflineInspectionRecord, ProductModel,
    RecordStatusChange, UserAccount,
};
use crate::domain::value_objects::LocalId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// ローカル永続ストアの契約。
///
/// すべての更新系呼び出しは復帰前に永続化を完了する。従って
/// 「アップロード成功とステータス更新の間のプロセス停止」だけが
/// 次回同期での二重アップロードの唯一の原因になる。
#[async_trait]
pub trait OfflineStore: Send + Sync {
    /// ドラフトを pending 状態で保存し、採番したローカルIDを返す。
    async fn insert_pending(&self, draft: InspectionDraft) -> Result<LocalId, AppError>;

    /// 同期候補を古い順に返す。
    /// status ∈ {pending, error} かつ retry_count が上限未満のもののみ。
    async fn list_pending(&self) -> Result<Vec<OfflineInspectionRecord>, AppError>;

    /// 1レコード分のステータス遷移を原子的に適用する。
    async fn update_status(&self, id: &LocalId, change: RecordStatusChange)
        -> Result<(), AppError>;

    /// 表示・監査用。synced レコードを新しい順に返す。
    async fn list_synced(&self, limit: u32) -> Result<Vec<OfflineInspectionRecord>, AppError>;

    /// synced_at が cutoff より古い synced レコードを削除し、件数を返す。
    /// pending / syncing / error は cutoff に関わらず残す。
    async fn purge_synced_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;

    /// 自動同期の対象となるレコード数。
    async fn pending_count(&self) -> Result<u64, AppError>;

    async fn get(&self, id: &LocalId) -> Result<Option<OfflineInspectionRecord>, AppError>;

    /// 再試行上限に達し、手動対応待ちのレコード。
    async fn list_exhausted(&self) -> Result<Vec<OfflineInspectionRecord>, AppError>;

    // リファレンスミラー。入れ替えは1トランザクションの全削除+一括挿入。
    async fn replace_product_models(&self, rows: Vec<ProductModel>) -> Result<(), AppError>;
    async fn replace_inspection_processes(
        &self,
        rows: Vec<InspectionProcess>,
    ) -> Result<(), AppError>;
    async fn replace_defect_types(&self, rows: Vec<DefectType>) -> Result<(), AppError>;
    async fn replace_machines(&self, rows: Vec<Machine>) -> Result<(), AppError>;
    async fn replace_users(&self, rows: Vec<UserAccount>) -> Result<(), AppError>;

    async fn cached_product_models(&self) -> Result<Vec<ProductModel>, AppError>;
    async fn cached_inspection_processes(&self) -> Result<Vec<InspectionProcess>, AppError>;
    async fn cached_defect_types(&self) -> Result<Vec<DefectType>, AppError>;
    async fn cached_machines(&self) -> Result<Vec<Machine>, AppError>;
    async fn cached_users(&self) -> Result<Vec<UserAccount>, AppError>;
}
