//! Storage manifest
//!
//! The manifest is the remote table of contents for an account: a version
//! counter, the device that wrote it, and the ordered list of every storage
//! id. It is replaced wholesale on each read or write, never edited in place.
//!
//! [`Manifest::deserialize`] expects plaintext. Decryption happens in
//! [`crate::sync::remote_to_local_manifest`].

use std::collections::BTreeMap;

use prost::Message;
use tracing::{debug, warn};

use crate::error::SyncResult;
use crate::proto::{self, manifest_record};
use crate::types::{StorageId, StorageIdType};

/// Decrypted storage manifest.
///
/// The per-type index is built once from `storage_ids` in [`Manifest::new`]
/// and there is no way to change one without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    version: u64,
    source_device_id: u32,
    storage_ids: Vec<StorageId>,
    ids_by_type: BTreeMap<i32, Vec<StorageId>>,
}

impl Manifest {
    pub fn new(version: u64, source_device_id: u32, storage_ids: Vec<StorageId>) -> Self {
        let mut ids_by_type: BTreeMap<i32, Vec<StorageId>> = BTreeMap::new();
        for id in &storage_ids {
            ids_by_type
                .entry(id.id_type_raw())
                .or_default()
                .push(id.clone());
        }
        Self {
            version,
            source_device_id,
            storage_ids,
            ids_by_type,
        }
    }

    /// Version 0 with no ids, the state before the first remote write
    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new())
    }

    /// Parse a plaintext manifest.
    ///
    /// Fails on malformed bytes. A partially parsed manifest is never returned.
    pub fn deserialize(plaintext: &[u8]) -> SyncResult<Self> {
        let record = proto::ManifestRecord::decode(plaintext)?;
        let storage_ids: Vec<StorageId> = record
            .identifiers
            .into_iter()
            .map(|identifier| StorageId::for_type(identifier.raw, identifier.id_type))
            .collect();

        let manifest = Self::new(record.version, record.source_device, storage_ids);
        debug!(
            version = manifest.version,
            source_device = manifest.source_device_id,
            ids = manifest.storage_ids.len(),
            "Deserialized manifest"
        );
        Ok(manifest)
    }

    /// Encode as plaintext. Unknown type tags are written back verbatim.
    pub fn serialize(&self) -> Vec<u8> {
        proto::ManifestRecord {
            version: self.version,
            identifiers: self
                .storage_ids
                .iter()
                .map(|id| manifest_record::Identifier {
                    raw: id.raw().to_vec(),
                    id_type: id.id_type_raw(),
                })
                .collect(),
            source_device: self.source_device_id,
        }
        .encode_to_vec()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn source_device_id(&self) -> u32 {
        self.source_device_id
    }

    pub fn storage_ids(&self) -> &[StorageId] {
        &self.storage_ids
    }

    /// The account record's id, if the manifest has one.
    ///
    /// There should be at most one. If a buggy writer left several, the first
    /// in manifest order wins.
    pub fn account_storage_id(&self) -> Option<&StorageId> {
        let accounts = self.storage_ids_by_type(StorageIdType::Account);
        if accounts.len() > 1 {
            warn!(
                version = self.version,
                count = accounts.len(),
                "Manifest lists more than one account record"
            );
        }
        accounts.first()
    }

    /// Ids of one known type, in manifest order
    pub fn storage_ids_by_type(&self, id_type: StorageIdType) -> &[StorageId] {
        self.storage_ids_by_raw_type(id_type.as_raw())
    }

    /// Ids with the given wire type tag, known or not
    pub fn storage_ids_by_raw_type(&self, id_type: i32) -> &[StorageId] {
        self.ids_by_type
            .get(&id_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_unknown_ids(&self) -> bool {
        self.storage_ids.iter().any(StorageId::is_unknown)
    }

    pub fn contains(&self, id: &StorageId) -> bool {
        self.storage_ids_by_raw_type(id.id_type_raw()).contains(id)
    }

    /// Look up an id by its raw key alone
    pub fn find_by_raw(&self, raw: &[u8]) -> Option<&StorageId> {
        self.storage_ids.iter().find(|id| id.raw() == raw)
    }
}
