use crate::application::ports::ChangeFeed;
use crate::domain::value_objects::WatchedCollection;
use crate::infrastructure::cache::MemoryCache;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// コレクション→失効対象キャッシュキーの静的対応表。
/// 実行時に推測せず、ここで宣言されたものだけを失効させる。
const INVALIDATION_TABLE: &[(WatchedCollection, &[&str])] = &[
    (
        WatchedCollection::Inspections,
        &["inspection_list", "dashboard_summary", "spc_metrics"],
    ),
    (
        WatchedCollection::InspectionResults,
        &["inspection_list", "dashboard_summary", "spc_metrics"],
    ),
    (
        WatchedCollection::Defects,
        &["defect_list", "dashboard_summary", "alert_list"],
    ),
    (
        WatchedCollection::Alerts,
        &["alert_list", "dashboard_summary"],
    ),
    (WatchedCollection::Users, &["user_list"]),
    (
        WatchedCollection::Machines,
        &["machine_list", "dashboard_summary"],
    ),
    (WatchedCollection::ProductModels, &["model_list"]),
];

pub fn keys_for(collection: WatchedCollection) -> &'static [&'static str] {
    INVALIDATION_TABLE
        .iter()
        .find(|(watched, _)| *watched == collection)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

struct Subscription {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// サーバプッシュの変更通知で読み取りキャッシュを失効させる。
///
/// 書き込みキュー（offline_inspections）には一切触れない。
/// 購読はインスタンスごとに常に1本で、`start` は既存の購読を
/// 張り替える（再起動が冪等になる）。購読エラー時の再接続は
/// ホストセッションのライフサイクルに任せる。
pub struct CacheInvalidator {
    cache: Arc<MemoryCache<serde_json::Value>>,
    subscription: Mutex<Option<Subscription>>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<MemoryCache<serde_json::Value>>) -> Self {
        Self {
            cache,
            subscription: Mutex::new(None),
        }
    }

    pub async fn start(&self, feed: &dyn ChangeFeed) {
        let mut subscription = self.subscription.lock().await;
        if let Some(previous) = subscription.take() {
            info!(target: "offline::realtime", "replacing existing change feed subscription");
            let _ = previous.shutdown.send(true);
            let _ = previous.handle.await;
        }

        info!(target: "offline::realtime", "change feed subscription connecting");
        let mut rx = feed.subscribe();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let cache = Arc::clone(&self.cache);

        let handle = tokio::spawn(async move {
            info!(target: "offline::realtime", "change feed subscribed");
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    event = rx.recv() => match event {
                        Ok(event) => {
                            let keys = keys_for(event.collection);
                            for key in keys {
                                cache.invalidate(key).await;
                            }
                            debug!(
                                target: "offline::realtime",
                                collection = %event.collection,
                                invalidated = keys.len(),
                                "read caches invalidated"
                            );
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            // 取りこぼした分はどのキーか分からないので全失効
                            warn!(
                                target: "offline::realtime",
                                skipped,
                                "change feed lagged, clearing all read caches"
                            );
                            cache.clear().await;
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            error!(
                                target: "offline::realtime",
                                "change feed closed, waiting for host session to resubscribe"
                            );
                            break;
                        }
                    },
                }
            }
        });

        *subscription = Some(Subscription {
            shutdown: shutdown_tx,
            handle,
        });
    }

    pub async fn stop(&self) {
        let subscription = self.subscription.lock().await.take();
        if let Some(subscription) = subscription {
            let _ = subscription.shutdown.send(true);
            let _ = subscription.handle.await;
            info!(target: "offline::realtime", "change feed subscription stopped");
        }
    }
}
