pub mod change_feed;
pub mod connectivity;
pub mod invalidator;

pub use change_feed::BroadcastChangeFeed;
pub use connectivity::SignalConnectivity;
pub use invalidator::CacheInvalidator;
