pub mod change_feed;
pub mod connectivity;
pub mod inspection_api;
pub mod offline_store;

pub use change_feed::ChangeFeed;
pub use connectivity::Connectivity;
pub use inspection_api::{InspectionApi, NewInspection, RemoteError};
pub use offline_store::OfflineStore;
