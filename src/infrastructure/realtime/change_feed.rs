use crate::application::ports::ChangeFeed;
use crate::domain::value_objects::ChangeEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// broadcastチャネル裏打ちの変更通知フィード。
///
/// 実運用ではホストセッションがリアルタイムトランスポートから
/// 受けた `{table, eventType}` を `publish` で流し込む。
/// テストでは直接イベントを注入できる。
pub struct BroadcastChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // 購読者ゼロは正常系（失効タスクが未起動なだけ）
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(
            target: "offline::realtime",
            collection = %event.collection,
            subscribers = delivered,
            "change event published"
        );
    }
}

impl ChangeFeed for BroadcastChangeFeed {
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}
