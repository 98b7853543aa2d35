pub mod api;
pub mod cache;
pub mod offline;
pub mod realtime;
