pub mod inspection_service;
pub mod network_monitor;
pub mod reference_cache_service;
pub mod sync_service;

pub use inspection_service::InspectionService;
pub use network_monitor::NetworkMonitor;
pub use reference_cache_service::ReferenceCacheService;
pub use sync_service::SyncEngine;
