use crate::application::ports::{Connectivity, InspectionApi, NewInspection, OfflineStore};
use crate::domain::entities::{NetworkStatusSnapshot, RecordStatusChange, SyncReport};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

struct SyncState {
    is_syncing: bool,
    last_report: Option<SyncReport>,
    last_synced_at: Option<DateTime<Utc>>,
}

/// 未送信レコードをリモートストアへ押し出す同期エンジン。
///
/// 1クライアントにつき同時に1パスのみ。再入は明示的な is_syncing
/// フラグで弾く（シングルスレッドのイベントループ前提でも、await を
/// 跨いでタイマー起動などが割り込むため、最初の suspension point より
/// 前にフラグを立てる必要がある）。
pub struct SyncEngine {
    store: Arc<dyn OfflineStore>,
    api: Arc<dyn InspectionApi>,
    connectivity: Arc<dyn Connectivity>,
    state: Arc<RwLock<SyncState>>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn OfflineStore>,
        api: Arc<dyn InspectionApi>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            store,
            api,
            connectivity,
            state: Arc::new(RwLock::new(SyncState {
                is_syncing: false,
                last_report: None,
                last_synced_at: None,
            })),
        }
    }

    /// 同期パスを1回実行する。
    ///
    /// オフラインなら何も触らずに `{0, 0, ["offline"]}` を返す。
    /// レコード単位の失敗はバッチを止めず、レポートに集計される。
    /// ストア書き込みの失敗だけがエラーとして呼び出し元へ伝播する。
    pub async fn sync_pending(&self) -> Result<SyncReport, AppError> {
        if !self.connectivity.is_online() {
            debug!(target: "offline::sync", "skipping sync pass while offline");
            return Ok(SyncReport::offline());
        }

        {
            let mut state = self.state.write().await;
            if state.is_syncing {
                debug!(target: "offline::sync", "sync pass already in progress");
                return Ok(SyncReport::already_running());
            }
            state.is_syncing = true;
        }

        let outcome = self.run_pass().await;

        let mut state = self.state.write().await;
        state.is_syncing = false;
        match outcome {
            Ok(report) => {
                info!(
                    target: "offline::sync",
                    success = report.success,
                    failed = report.failed,
                    "sync pass finished"
                );
                state.last_report = Some(report.clone());
                state.last_synced_at = Some(Utc::now());
                Ok(report)
            }
            Err(err) => Err(err),
        }
    }

    /// 候補を古い順に、1件ずつ直列にアップロードする。
    /// 並列化しない: 検査員ごとの投入順を保ち、リモートへの負荷を抑える。
    async fn run_pass(&self) -> Result<SyncReport, AppError> {
        let candidates = self.store.list_pending().await?;
        let mut report = SyncReport::default();

        for record in candidates {
            self.store
                .update_status(&record.local_id, RecordStatusChange::syncing())
                .await?;

            let payload = NewInspection::from_record(&record);
            match self.api.create_inspection(&payload).await {
                Ok(remote_id) => {
                    self.store
                        .update_status(&record.local_id, RecordStatusChange::synced(Utc::now()))
                        .await?;
                    debug!(
                        target: "offline::sync",
                        local_id = %record.local_id,
                        remote_id = %remote_id,
                        "record accepted by remote store"
                    );
                    report.record_success();
                }
                Err(err) => {
                    let change = if err.is_retryable() {
                        RecordStatusChange::failed(err.to_string())
                    } else {
                        RecordStatusChange::rejected(err.to_string())
                    };
                    self.store.update_status(&record.local_id, change).await?;
                    warn!(
                        target: "offline::sync",
                        local_id = %record.local_id,
                        retryable = err.is_retryable(),
                        error = %err,
                        "record upload failed"
                    );
                    report.record_failure(format!("{}: {}", record.local_id, err));
                }
            }
        }

        Ok(report)
    }

    pub async fn is_syncing(&self) -> bool {
        self.state.read().await.is_syncing
    }

    /// UIクローム向けのスナップショット。毎回再計算する。
    pub async fn status_snapshot(&self) -> Result<NetworkStatusSnapshot, AppError> {
        let pending_count = self.store.pending_count().await?;
        let state = self.state.read().await;
        Ok(NetworkStatusSnapshot {
            is_online: self.connectivity.is_online(),
            pending_count,
            is_syncing: state.is_syncing,
            last_report: state.last_report.clone(),
            last_synced_at: state.last_synced_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::RemoteError;
    use crate::domain::entities::InspectionDraft;
    use crate::domain::value_objects::RecordStatus;
    use crate::infrastructure::offline::SqliteOfflineStore;
    use crate::infrastructure::realtime::SignalConnectivity;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Mutex;

    struct StubApi {
        outcomes: Mutex<VecDeque<Result<String, RemoteError>>>,
        calls: AtomicU32,
        delay: Option<std::time::Duration>,
    }

    impl StubApi {
        fn accepting() -> Self {
            Self {
                outcomes: Mutex::new(VecDeque::new()),
                calls: AtomicU32::new(0),
                delay: None,
            }
        }

        fn with_outcomes(outcomes: Vec<Result<String, RemoteError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
                delay: None,
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InspectionApi for StubApi {
        async fn create_inspection(&self, new: &NewInspection) -> Result<String, RemoteError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcomes.lock().await.pop_front() {
                Some(outcome) => outcome,
                None => Ok(format!("srv-{}-{}", call, new.client_reference)),
            }
        }

        async fn fetch_product_models(
            &self,
        ) -> Result<Vec<crate::domain::entities::ProductModel>, RemoteError> {
            Ok(Vec::new())
        }

        async fn fetch_inspection_processes(
            &self,
        ) -> Result<Vec<crate::domain::entities::InspectionProcess>, RemoteError> {
            Ok(Vec::new())
        }

        async fn fetch_defect_types(
            &self,
        ) -> Result<Vec<crate::domain::entities::DefectType>, RemoteError> {
            Ok(Vec::new())
        }

        async fn fetch_machines(
            &self,
        ) -> Result<Vec<crate::domain::entities::Machine>, RemoteError> {
            Ok(Vec::new())
        }

        async fn fetch_users(
            &self,
        ) -> Result<Vec<crate::domain::entities::UserAccount>, RemoteError> {
            Ok(Vec::new())
        }
    }

    async fn setup_store() -> Arc<SqliteOfflineStore> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Arc::new(SqliteOfflineStore::new(pool, 3))
    }

    fn sample_draft(index: u32) -> InspectionDraft {
        InspectionDraft::new(
            format!("model-{index}"),
            "process-1".into(),
            Some("defect-1".into()),
            Some("machine-7".into()),
            "inspector-1".into(),
            "佐藤".into(),
            50,
            2,
            None,
            None,
        )
        .unwrap()
    }

    fn engine(
        store: Arc<SqliteOfflineStore>,
        api: Arc<StubApi>,
        online: bool,
    ) -> (SyncEngine, Arc<SignalConnectivity>) {
        let connectivity = Arc::new(SignalConnectivity::new(online));
        let engine = SyncEngine::new(store, api, connectivity.clone());
        (engine, connectivity)
    }

    #[tokio::test]
    async fn test_offline_pass_touches_nothing() {
        let store = setup_store().await;
        let api = Arc::new(StubApi::accepting());
        let id = store.insert_pending(sample_draft(1)).await.unwrap();

        let (engine, _) = engine(store.clone(), api.clone(), false);
        let report = engine.sync_pending().await.unwrap();

        assert_eq!(report, SyncReport::offline());
        assert_eq!(api.call_count(), 0);
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::Pending);
    }

    #[tokio::test]
    async fn test_successful_pass_marks_all_synced() {
        let store = setup_store().await;
        let api = Arc::new(StubApi::accepting());
        for i in 0..3 {
            store.insert_pending(sample_draft(i)).await.unwrap();
        }
        assert_eq!(store.pending_count().await.unwrap(), 3);

        let (engine, _) = engine(store.clone(), api.clone(), true);
        let report = engine.sync_pending().await.unwrap();

        assert_eq!(report.success, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(store.pending_count().await.unwrap(), 0);
        for record in store.list_synced(10).await.unwrap() {
            assert_eq!(record.status, RecordStatus::Synced);
            assert!(record.synced_at.is_some());
            assert!(record.error_message.is_none());
        }
    }

    #[tokio::test]
    async fn test_transient_failure_increments_retry_and_continues() {
        let store = setup_store().await;
        let api = Arc::new(StubApi::with_outcomes(vec![
            Err(RemoteError::Network("connection reset".into())),
            Ok("srv-ok".into()),
        ]));
        let failing = store.insert_pending(sample_draft(1)).await.unwrap();
        store.insert_pending(sample_draft(2)).await.unwrap();

        let (engine, _) = engine(store.clone(), api, true);
        let report = engine.sync_pending().await.unwrap();

        assert_eq!(report.success, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);

        let record = store.get(&failing).await.unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::Error);
        assert_eq!(record.retry_count, 1);
        assert!(record.error_message.unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_validation_rejection_exhausts_retries() {
        let store = setup_store().await;
        let api = Arc::new(StubApi::with_outcomes(vec![Err(RemoteError::Validation(
            "defect quantity out of range".into(),
        ))]));
        let id = store.insert_pending(sample_draft(1)).await.unwrap();

        let (engine, _) = engine(store.clone(), api.clone(), true);
        let report = engine.sync_pending().await.unwrap();
        assert_eq!(report.failed, 1);

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::Error);
        assert_eq!(record.retry_count, 3);

        // 以降のパスでは候補に現れない
        let second = engine.sync_pending().await.unwrap();
        assert_eq!(second.attempted(), 0);
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_record_is_skipped() {
        let store = setup_store().await;
        let api = Arc::new(StubApi::with_outcomes(vec![
            Err(RemoteError::Network("down".into())),
            Err(RemoteError::Network("down".into())),
            Err(RemoteError::Network("down".into())),
        ]));
        let id = store.insert_pending(sample_draft(1)).await.unwrap();

        let (engine, _) = engine(store.clone(), api.clone(), true);
        for _ in 0..3 {
            engine.sync_pending().await.unwrap();
        }
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.retry_count, 3);

        let report = engine.sync_pending().await.unwrap();
        assert_eq!(report.attempted(), 0);
        assert_eq!(api.call_count(), 3);
        assert_eq!(store.list_exhausted().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_pass_is_rejected() {
        let store = setup_store().await;
        let api = Arc::new(StubApi {
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
            delay: Some(std::time::Duration::from_millis(200)),
        });
        store.insert_pending(sample_draft(1)).await.unwrap();

        let (engine, _) = engine(store.clone(), api, true);
        let engine = Arc::new(engine);

        let background = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.sync_pending().await.unwrap() })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let overlapping = engine.sync_pending().await.unwrap();
        assert_eq!(overlapping, SyncReport::already_running());

        let first = background.await.unwrap();
        assert_eq!(first.success, 1);
        assert!(!engine.is_syncing().await);
    }

    #[tokio::test]
    async fn test_status_snapshot_reflects_store_and_signal() {
        let store = setup_store().await;
        let api = Arc::new(StubApi::accepting());
        store.insert_pending(sample_draft(1)).await.unwrap();

        let (engine, connectivity) = engine(store.clone(), api, true);

        let before = engine.status_snapshot().await.unwrap();
        assert!(before.is_online);
        assert_eq!(before.pending_count, 1);
        assert!(before.last_report.is_none());

        engine.sync_pending().await.unwrap();
        connectivity.set_online(false);

        let after = engine.status_snapshot().await.unwrap();
        assert!(!after.is_online);
        assert_eq!(after.pending_count, 0);
        assert_eq!(after.last_report.as_ref().unwrap().success, 1);
        assert!(after.last_synced_at.is_some());
    }
}
