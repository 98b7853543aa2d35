use crate::domain::value_objects::ChangeEvent;
use tokio::sync::broadcast;

/// サーバプッシュの変更通知チャネル。
///
/// トランスポート（WebSocket等）の再接続はホスト側セッションの責務で、
/// 購読側は受信と失効処理だけを行う。
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
