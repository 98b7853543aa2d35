use crate::application::ports::{Connectivity, OfflineStore};
use crate::application::services::reference_cache_service::ReferenceCacheService;
use crate::application::services::sync_service::SyncEngine;
use crate::domain::entities::NetworkStatusSnapshot;
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct MonitorTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// 接続状態の遷移と定期タイマーから同期をスケジュールする監視役。
///
/// オンライン遷移時は (a) リファレンス更新 → (b) 同期パス →
/// (c) 未送信件数の再計算 を直列に行う。(a) の失敗は致命ではない
/// （stale なミラーが残っていれば十分）。
/// オフライン遷移時はフラグを倒すだけで、ネットワーク呼び出しはしない。
pub struct NetworkMonitor {
    connectivity: Arc<dyn Connectivity>,
    engine: Arc<SyncEngine>,
    reference: Arc<ReferenceCacheService>,
    store: Arc<dyn OfflineStore>,
    config: SyncConfig,
    task: Mutex<Option<MonitorTask>>,
}

impl NetworkMonitor {
    pub fn new(
        connectivity: Arc<dyn Connectivity>,
        engine: Arc<SyncEngine>,
        reference: Arc<ReferenceCacheService>,
        store: Arc<dyn OfflineStore>,
        config: SyncConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            connectivity,
            engine,
            reference,
            store,
            config,
            task: Mutex::new(None),
        })
    }

    /// 監視タスクを起動する。二重起動は無視される。
    pub async fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            warn!(target: "offline::monitor", "network monitor already running");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            monitor.run_loop(shutdown_rx).await;
        });

        *task = Some(MonitorTask {
            shutdown: shutdown_tx,
            handle,
        });
        info!(
            target: "offline::monitor",
            interval_secs = self.config.sync_interval,
            "network monitor started"
        );
    }

    /// リスナーを解除して監視を止める。
    /// 実行中の同期パスは中断されず、完了してからタスクが終了する。
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            let _ = task.shutdown.send(true);
            if let Err(err) = task.handle.await {
                warn!(target: "offline::monitor", error = %err, "monitor task join failed");
            }
            info!(target: "offline::monitor", "network monitor stopped");
        }
    }

    pub async fn status(&self) -> Result<NetworkStatusSnapshot, AppError> {
        self.engine.status_snapshot().await
    }

    async fn run_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut connectivity_rx = self.connectivity.watch();
        let mut was_online = *connectivity_rx.borrow_and_update();

        // 起動時点でオンラインなら遷移扱いで一度だけ実行する
        if was_online {
            self.handle_online().await;
        }

        let period = Duration::from_secs(self.config.sync_interval.max(1));
        // interval() の初回即時発火を避ける
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                changed = connectivity_rx.changed() => {
                    if changed.is_err() {
                        warn!(target: "offline::monitor", "connectivity signal dropped");
                        break;
                    }
                    let online = *connectivity_rx.borrow_and_update();
                    if online && !was_online {
                        info!(target: "offline::monitor", "connection restored");
                        self.handle_online().await;
                    } else if !online && was_online {
                        info!(target: "offline::monitor", "connection lost, holding records locally");
                    }
                    was_online = online;
                }
                _ = ticker.tick() => {
                    if was_online && self.config.auto_sync {
                        self.handle_tick().await;
                    }
                }
            }
        }
    }

    async fn handle_online(&self) {
        match self.reference.refresh_all().await {
            Ok(report) if !report.is_complete() => {
                warn!(
                    target: "offline::monitor",
                    failed = report.failed.len(),
                    "reference refresh partially failed, continuing with sync"
                );
            }
            Ok(_) => {}
            Err(err) => {
                // stale なミラーで続行できるため同期は諦めない
                error!(target: "offline::monitor", error = %err, "reference refresh failed");
            }
        }

        if let Err(err) = self.engine.sync_pending().await {
            error!(target: "offline::monitor", error = %err, "sync pass failed");
        }

        match self.store.pending_count().await {
            Ok(count) => {
                debug!(target: "offline::monitor", pending = count, "pending count recomputed");
            }
            Err(err) => {
                error!(target: "offline::monitor", error = %err, "pending count recompute failed");
            }
        }
    }

    /// 定期タイマー。再試行待ちのレコードや、前回パス中に追加された
    /// レコードを拾う安全網。あわせて保持期限切れの synced レコードを
    /// 掃除する。
    async fn handle_tick(&self) {
        if self.engine.is_syncing().await {
            debug!(target: "offline::monitor", "tick skipped, sync pass in flight");
            return;
        }

        match self.store.pending_count().await {
            Ok(0) => {}
            Ok(pending) => {
                debug!(target: "offline::monitor", pending, "periodic sync triggered");
                if let Err(err) = self.engine.sync_pending().await {
                    error!(target: "offline::monitor", error = %err, "periodic sync failed");
                }
            }
            Err(err) => {
                error!(target: "offline::monitor", error = %err, "pending count read failed");
                return;
            }
        }

        let cutoff = Utc::now() - ChronoDuration::days(i64::from(self.config.retention_days));
        match self.store.purge_synced_older_than(cutoff).await {
            Ok(0) => {}
            Ok(purged) => {
                info!(target: "offline::monitor", purged, "purged synced records past retention");
            }
            Err(err) => {
                error!(target: "offline::monitor", error = %err, "retention purge failed");
            }
        }
    }
}
