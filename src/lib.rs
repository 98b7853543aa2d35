pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
mod state;

pub use application::ports::{ChangeFeed, Connectivity, InspectionApi, NewInspection, RemoteError};
pub use application::services::{
    InspectionService, NetworkMonitor, ReferenceCacheService, SyncEngine,
};
pub use domain::entities::{
    InspectionDraft, NetworkStatusSnapshot, OfflineInspectionRecord, ReferenceRefreshReport,
    SyncReport,
};
pub use domain::value_objects::{ChangeEvent, ChangeEventType, LocalId, RecordStatus, WatchedCollection};
pub use infrastructure::api::HttpInspectionApi;
pub use infrastructure::offline::SqliteOfflineStore;
pub use infrastructure::realtime::{BroadcastChangeFeed, CacheInvalidator, SignalConnectivity};
pub use shared::{AppConfig, AppError};
pub use state::AppState;

/// ホストアプリ向けのログ初期化。
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kensa=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
