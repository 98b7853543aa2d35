use crate::application::ports::Connectivity;
use tokio::sync::watch;
use tracing::info;

/// watchチャネル裏打ちの接続シグナル。
///
/// プラットフォーム側（ブラウザのonline/offlineイベントや
/// OSの到達性通知）をホストが `set_online` でブリッジする。
pub struct SignalConnectivity {
    tx: watch::Sender<bool>,
}

impl SignalConnectivity {
    pub fn new(initial_online: bool) -> Self {
        let (tx, _) = watch::channel(initial_online);
        Self { tx }
    }

    pub fn set_online(&self, online: bool) {
        let previous = *self.tx.borrow();
        if previous != online {
            info!(
                target: "offline::connectivity",
                online,
                "connectivity transition"
            );
        }
        // 受信側が全て落ちていても現在値は保持する
        let _ = self.tx.send(online);
    }
}

impl Connectivity for SignalConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
