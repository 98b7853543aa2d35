pub mod change_event;
pub mod local_id;
pub mod photo_payload;
pub mod record_status;

pub use change_event::{ChangeEvent, ChangeEventType, WatchedCollection};
pub use local_id::LocalId;
pub use photo_payload::{PhotoPayload, MAX_PHOTO_BYTES};
pub use record_status::RecordStatus;
