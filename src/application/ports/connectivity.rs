use tokio::sync::watch;

/// プラットフォームの接続シグナル。
///
/// `is_online` は現在値、`watch` は遷移イベントの購読口。
/// シグナル自体は真実の源ではなく、同期エンジンは毎パス冒頭で
/// 現在値を読み直す。
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
    fn watch(&self) -> watch::Receiver<bool>;
}
