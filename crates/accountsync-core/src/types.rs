//! Core types for account storage sync

pub mod service_id;
pub mod storage_id;

pub use service_id::{is_valid_e164, Aci, Pni, ServiceId};
pub use storage_id::{StorageId, StorageIdType, RAW_STORAGE_ID_LENGTH};
