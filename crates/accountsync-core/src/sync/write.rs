//! Manifest write preparation
//!
//! A write replaces the remote manifest and, in the same request, inserts new
//! items and deletes stale ones. Remote items are immutable: a changed record
//! is inserted under a fresh key (see [`StorageRecord::rotated`]) and its old
//! key deleted.

use std::fmt;

use tracing::debug;

use crate::crypto::StorageCipher;
use crate::error::{SyncError, SyncResult};
use crate::manifest::Manifest;
use crate::proto::WriteOperation;
use crate::records::StorageRecord;
use crate::sync::translate::{local_to_remote_manifest, local_to_remote_record};
use crate::types::StorageId;

/// A checked manifest write, ready to encrypt
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOperationResult {
    manifest: Manifest,
    inserts: Vec<StorageRecord>,
    deletes: Vec<StorageId>,
}

impl WriteOperationResult {
    /// Check a write against the last manifest version the remote acknowledged.
    ///
    /// Fails with [`SyncError::VersionRegression`] unless the new manifest's
    /// version is strictly greater than `previous_version`. The remaining
    /// checks catch caller bugs and fail with [`SyncError::UnknownRecordWrite`]
    /// or [`SyncError::InvalidOperation`]:
    ///
    /// - no insert may be an unknown record
    /// - every insert must be listed in the new manifest
    /// - no delete may still be listed in the new manifest
    pub fn new(
        previous_version: u64,
        manifest: Manifest,
        inserts: Vec<StorageRecord>,
        deletes: Vec<StorageId>,
    ) -> SyncResult<Self> {
        if manifest.version() <= previous_version {
            return Err(SyncError::VersionRegression {
                previous: previous_version,
                new: manifest.version(),
            });
        }

        for insert in &inserts {
            if let StorageRecord::Unknown(id) = insert {
                return Err(SyncError::UnknownRecordWrite(id.clone()));
            }
            if !manifest.contains(insert.id()) {
                return Err(SyncError::InvalidOperation(format!(
                    "Insert {} is not listed in manifest version {}",
                    insert.id(),
                    manifest.version()
                )));
            }
        }

        if let Some(id) = deletes.iter().find(|id| manifest.contains(id)) {
            return Err(SyncError::InvalidOperation(format!(
                "Delete {} is still listed in manifest version {}",
                id,
                manifest.version()
            )));
        }

        Ok(Self {
            manifest,
            inserts,
            deletes,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn inserts(&self) -> &[StorageRecord] {
        &self.inserts
    }

    pub fn deletes(&self) -> &[StorageId] {
        &self.deletes
    }

    /// True when the write changes no items, only the manifest
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.deletes.is_empty()
    }

    /// Encrypt the manifest and every insert into the request body
    pub fn to_write_operation<C: StorageCipher + ?Sized>(
        &self,
        keys: &C,
    ) -> SyncResult<WriteOperation> {
        let manifest = local_to_remote_manifest(&self.manifest, keys)?;
        let insert_item = self
            .inserts
            .iter()
            .map(|record| local_to_remote_record(record, keys))
            .collect::<SyncResult<Vec<_>>>()?;
        let delete_key = self.deletes.iter().map(|id| id.raw().to_vec()).collect();

        debug!(write = %self, "Prepared write operation");

        Ok(WriteOperation {
            manifest: Some(manifest),
            insert_item,
            delete_key,
            clear_all: false,
        })
    }
}

impl fmt::Display for WriteOperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ManifestVersion: {}, Total Keys: {}, Inserts: {}, Deletes: {}",
            self.manifest.version(),
            self.manifest.storage_ids().len(),
            self.inserts.len(),
            self.deletes.len()
        )
    }
}
