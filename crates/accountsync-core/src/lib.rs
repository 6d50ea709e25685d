//! Account Storage Sync Core Library
//!
//! Typed records, manifest and encrypted translation layer for syncing
//! account-level state through a storage service that only ever sees opaque
//! ciphertext.
//!
//! ## Overview
//!
//! Account state (contacts, groups, account settings, story distribution
//! lists, call links) is stored remotely as one encrypted item per record plus
//! an encrypted manifest listing every item's [`StorageId`]. This crate owns
//! the client side of that format:
//!
//! - **Identifiers**: [`StorageId`] pairs an open-ended type tag with a random
//!   raw key.
//! - **Records**: [`StorageRecord`] is a sum type over the six record kinds
//!   plus `Unknown`. Each kind has an immutable record and a builder.
//! - **Manifest**: [`Manifest`] is the versioned, ordered id list.
//! - **Translation**: [`sync`] converts between the remote blobs and the
//!   typed model with an injected [`StorageCipher`].
//!
//! ## Forward compatibility
//!
//! Newer clients add record kinds, type tags and fields. This crate keeps all
//! three intact: unknown type tags survive a manifest round trip, unknown
//! kinds decode to [`StorageRecord::Unknown`] without an error, and unknown
//! fields inside a known record are written back byte for byte.
//!
//! ## Quick Start
//!
//! ```
//! use accountsync_core::{
//!     local_to_remote_record, remote_to_local_record, ContactRecordBuilder, StorageKey,
//!     StorageRecord,
//! };
//!
//! let keys = StorageKey::generate();
//! let record: StorageRecord = ContactRecordBuilder::new(vec![1u8; 16])
//!     .with_e164(Some("+15551234567"))
//!     .with_blocked(true)
//!     .build()
//!     .into();
//!
//! let item = local_to_remote_record(&record, &keys)?;
//! let resolved = remote_to_local_record(&item, record.id().id_type_raw(), &keys)?;
//! assert!(record.describe_diff(&resolved).is_empty());
//! # Ok::<(), accountsync_core::SyncError>(())
//! ```

pub mod crypto;
pub mod error;
pub mod manifest;
pub mod proto;
pub mod records;
pub mod sync;
pub mod types;

// Re-exports
pub use crypto::{ItemKey, StorageCipher, StorageKey};
pub use error::{SyncError, SyncResult};
pub use manifest::Manifest;
pub use records::{
    AccountRecord, AccountRecordBuilder, CallLinkRecord, CallLinkRecordBuilder, ContactRecord,
    ContactRecordBuilder, DiffDescription, GroupV1Record, GroupV1RecordBuilder, GroupV2Record,
    GroupV2RecordBuilder, StorageRecord, StoryDistributionListRecord,
    StoryDistributionListRecordBuilder,
};
pub use sync::{
    find_id_difference, local_to_remote_manifest, local_to_remote_record,
    remote_to_local_manifest, remote_to_local_record, remote_to_local_records, IdDifference,
    WriteOperationResult,
};
pub use types::*;
