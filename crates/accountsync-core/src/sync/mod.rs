//! Translation between the encrypted remote store and typed local records
//!
//! ## Overview
//!
//! The remote store holds one encrypted manifest per account plus one
//! encrypted item per record. It never sees plaintext. This module turns those
//! blobs into a [`Manifest`] and [`StorageRecord`]s and back, using an injected
//! [`StorageCipher`] for every key derivation and AEAD operation.
//!
//! ## Data flow
//!
//! ```text
//! read:
//!   StorageManifest ──decrypt(manifest_key(v))──▶ ManifestRecord ──▶ Manifest
//!   StorageItem     ──decrypt(item_key(raw))───▶ envelope ──dispatch──▶ StorageRecord
//!
//! write:
//!   StorageRecord ──encode──▶ envelope ──encrypt(item_key(raw))──▶ StorageItem
//!   Manifest      ──encode──▶ ManifestRecord ──encrypt(manifest_key(v))──▶ StorageManifest
//!   WriteOperationResult ──▶ WriteOperation { manifest, inserts, deletes }
//! ```
//!
//! ## Failure scope
//!
//! - Manifest decrypt or decode failures abort the whole pass.
//! - Item failures are scoped to that item.
//! - Unknown or mismatched record kinds are not failures: they become
//!   [`StorageRecord::Unknown`], which is listed in the next manifest but never
//!   re-uploaded.
//!
//! Everything here is a pure function of its inputs and safe to call from any
//! number of threads.
//!
//! [`Manifest`]: crate::manifest::Manifest
//! [`StorageRecord`]: crate::records::StorageRecord
//! [`StorageRecord::Unknown`]: crate::records::StorageRecord::Unknown
//! [`StorageCipher`]: crate::crypto::StorageCipher

pub mod id_difference;
pub mod translate;
pub mod write;

pub use id_difference::{find_id_difference, IdDifference};
pub use translate::{
    local_to_remote_manifest, local_to_remote_record, remote_to_local_manifest,
    remote_to_local_record, remote_to_local_records,
};
pub use write::WriteOperationResult;
