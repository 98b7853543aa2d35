use crate::application::ports::InspectionApi;
use crate::application::services::{
    InspectionService, NetworkMonitor, ReferenceCacheService, SyncEngine,
};
use crate::infrastructure::cache::MemoryCache;
use crate::infrastructure::offline::SqliteOfflineStore;
use crate::infrastructure::realtime::{BroadcastChangeFeed, CacheInvalidator, SignalConnectivity};
use crate::shared::config::AppConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const CHANGE_FEED_CAPACITY: usize = 256;

/// ライブラリ全体の配線。ホストUIはこれを1つ持ち、
/// 接続シグナルと変更通知をブリッジするだけで良い。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<SqliteOfflineStore>,
    pub inspections: Arc<InspectionService>,
    pub sync: Arc<SyncEngine>,
    pub reference: Arc<ReferenceCacheService>,
    pub monitor: Arc<NetworkMonitor>,
    pub connectivity: Arc<SignalConnectivity>,
    pub change_feed: Arc<BroadcastChangeFeed>,
    pub read_cache: Arc<MemoryCache<serde_json::Value>>,
    pub invalidator: Arc<CacheInvalidator>,
}

impl AppState {
    pub async fn new(
        config: AppConfig,
        api: Arc<dyn InspectionApi>,
        initially_online: bool,
    ) -> anyhow::Result<Self> {
        ensure_data_dir(&config.database.url)?;

        let store = Arc::new(
            SqliteOfflineStore::connect(&config.database, config.sync.max_retry).await?,
        );
        let store_port: Arc<dyn crate::application::ports::OfflineStore> = store.clone();

        let connectivity = Arc::new(SignalConnectivity::new(initially_online));
        let inspections = Arc::new(InspectionService::new(store_port.clone()));
        let sync = Arc::new(SyncEngine::new(
            store_port.clone(),
            api.clone(),
            connectivity.clone(),
        ));
        let reference = Arc::new(ReferenceCacheService::new(store_port.clone(), api));
        let monitor = NetworkMonitor::new(
            connectivity.clone(),
            sync.clone(),
            reference.clone(),
            store_port,
            config.sync.clone(),
        );

        let read_cache = Arc::new(MemoryCache::new(Duration::from_secs(
            config.cache.read_cache_ttl,
        )));
        let change_feed = Arc::new(BroadcastChangeFeed::new(CHANGE_FEED_CAPACITY));
        let invalidator = Arc::new(CacheInvalidator::new(read_cache.clone()));

        Ok(Self {
            config,
            store,
            inspections,
            sync,
            reference,
            monitor,
            connectivity,
            change_feed,
            read_cache,
            invalidator,
        })
    }

    /// バックグラウンドの監視と失効購読を起動する。
    pub async fn start(&self) {
        self.monitor.start().await;
        self.invalidator.start(self.change_feed.as_ref()).await;
    }

    pub async fn shutdown(&self) {
        self.monitor.stop().await;
        self.invalidator.stop().await;
    }
}

fn ensure_data_dir(database_url: &str) -> anyhow::Result<()> {
    if let Some(raw_path) = database_url.strip_prefix("sqlite://") {
        let path = raw_path.split('?').next().unwrap_or(raw_path);
        if path != ":memory:" && !path.is_empty() {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
    }
    Ok(())
}
