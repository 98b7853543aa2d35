use crate::application::ports::OfflineStore;
use crate::domain::entities::{InspectionDraft, OfflineInspectionRecord};
use crate::domain::value_objects::LocalId;
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::info;

/// 検査結果投入のファサード。UI側はオンライン・オフラインを意識せず、
/// 常にローカルストアへ pending として書き込む。実際の送信は
/// SyncEngine が担う。
pub struct InspectionService {
    store: Arc<dyn OfflineStore>,
}

impl InspectionService {
    pub fn new(store: Arc<dyn OfflineStore>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, draft: InspectionDraft) -> Result<LocalId, AppError> {
        let local_id = self.store.insert_pending(draft).await?;
        info!(
            target: "offline::inspection",
            local_id = %local_id,
            "inspection recorded locally"
        );
        Ok(local_id)
    }

    pub async fn record(&self, id: &LocalId) -> Result<Option<OfflineInspectionRecord>, AppError> {
        self.store.get(id).await
    }

    pub async fn recent_synced(
        &self,
        limit: u32,
    ) -> Result<Vec<OfflineInspectionRecord>, AppError> {
        self.store.list_synced(limit).await
    }

    /// 手動対応待ち（再試行上限到達）のレコード。
    pub async fn needs_attention(&self) -> Result<Vec<OfflineInspectionRecord>, AppError> {
        self.store.list_exhausted().await
    }

    pub async fn pending_count(&self) -> Result<u64, AppError> {
        self.store.pending_count().await
    }
}
