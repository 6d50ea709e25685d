//! Remote ⇄ local translation
//!
//! ## Item plaintext layout
//!
//! A decrypted item is a `StorageRecord` envelope with exactly one
//! length-delimited field. The field number is the record kind and equals the
//! raw [`StorageIdType`] value:
//!
//! ```text
//! +-------------------+-------------+------------------------------+
//! | key (tag << 3 | 2)| varint len  | record payload (+ unknowns)  |
//! +-------------------+-------------+------------------------------+
//! ```
//!
//! The envelope is walked with [`FieldIter`] rather than decoded through prost
//! so the payload bytes, including fields this client doesn't know, reach the
//! record type untouched.

use tracing::{debug, warn};

use crate::crypto::StorageCipher;
use crate::error::{SyncError, SyncResult};
use crate::manifest::Manifest;
use crate::proto::unknown_fields::{encode_len_field, FieldIter, WIRE_LEN};
use crate::proto::{StorageItem, StorageManifest};
use crate::records::{
    AccountRecord, CallLinkRecord, ContactRecord, GroupV1Record, GroupV2Record,
    StorageRecord, StoryDistributionListRecord,
};
use crate::types::{StorageId, StorageIdType};

/// Decrypt and parse a remote manifest.
///
/// Any failure here must abort the sync pass: a manifest that didn't decrypt
/// or parse cleanly is never partially trusted.
pub fn remote_to_local_manifest<C: StorageCipher + ?Sized>(
    remote: &StorageManifest,
    keys: &C,
) -> SyncResult<Manifest> {
    let key = keys.manifest_key(remote.version);
    let plaintext = keys.decrypt(&key, &remote.value)?;
    let manifest = Manifest::deserialize(&plaintext)?;

    if manifest.version() != remote.version {
        warn!(
            outer = remote.version,
            inner = manifest.version(),
            "Manifest version mismatch between envelope and payload"
        );
    }
    Ok(manifest)
}

/// Encrypt a manifest for upload under its own version's key
pub fn local_to_remote_manifest<C: StorageCipher + ?Sized>(
    manifest: &Manifest,
    keys: &C,
) -> SyncResult<StorageManifest> {
    let key = keys.manifest_key(manifest.version());
    let value = keys.encrypt(&key, &manifest.serialize())?;
    debug!(
        version = manifest.version(),
        ids = manifest.storage_ids().len(),
        "Encrypted manifest"
    );
    Ok(StorageManifest {
        version: manifest.version(),
        value,
    })
}

/// Decrypt one remote item and dispatch it to its record kind.
///
/// `expected_type` is the raw type tag the manifest lists for this item's key.
/// The result is [`StorageRecord::Unknown`] when that type is one this client
/// doesn't know, when the payload's own kind disagrees with it, or when the
/// payload can't be represented as its kind (a bad GroupV2 master key). Only
/// decryption and malformed bytes are errors.
pub fn remote_to_local_record<C: StorageCipher + ?Sized>(
    item: &StorageItem,
    expected_type: i32,
    keys: &C,
) -> SyncResult<StorageRecord> {
    let key = keys.item_key(&item.key);
    let plaintext = keys.decrypt(&key, &item.value)?;
    let id = StorageId::for_type(item.key.clone(), expected_type);

    let Some((tag, payload)) = find_record_payload(&plaintext)? else {
        debug!(%id, "Item envelope has no known record kind");
        return Ok(StorageRecord::Unknown(id));
    };

    let Some(kind) = id.id_type() else {
        debug!(%id, "Item type unknown to this client");
        return Ok(StorageRecord::Unknown(id));
    };

    if kind.as_raw() as u32 != tag {
        warn!(%id, payload_kind = tag, "Item payload kind does not match its storage id");
        return Ok(StorageRecord::Unknown(id));
    }

    let raw = item.key.clone();
    let record: StorageRecord = match kind {
        StorageIdType::Contact => ContactRecord::decode_payload(raw, payload)?.into(),
        StorageIdType::GroupV1 => GroupV1Record::decode_payload(raw, payload)?.into(),
        StorageIdType::GroupV2 => match GroupV2Record::decode_payload(raw, payload)? {
            Some(record) => record.into(),
            None => {
                warn!(%id, "GroupV2 item not representable, keeping as unknown");
                StorageRecord::Unknown(id)
            }
        },
        StorageIdType::Account => AccountRecord::decode_payload(raw, payload)?.into(),
        StorageIdType::StoryDistributionList => {
            StoryDistributionListRecord::decode_payload(raw, payload)?.into()
        }
        StorageIdType::CallLink => CallLinkRecord::decode_payload(raw, payload)?.into(),
    };
    Ok(record)
}

/// Decrypt a batch of items listed in `manifest`.
///
/// Each item gets its own result so one bad item doesn't sink the rest. An
/// item whose key the manifest doesn't list is an
/// [`SyncError::InvalidOperation`].
pub fn remote_to_local_records<C: StorageCipher + ?Sized>(
    items: &[StorageItem],
    manifest: &Manifest,
    keys: &C,
) -> Vec<SyncResult<StorageRecord>> {
    items
        .iter()
        .map(|item| {
            let id = manifest.find_by_raw(&item.key).ok_or_else(|| {
                SyncError::InvalidOperation(format!(
                    "Item {} is not listed in manifest version {}",
                    hex::encode(&item.key),
                    manifest.version()
                ))
            })?;
            remote_to_local_record(item, id.id_type_raw(), keys)
        })
        .collect()
}

/// Encrypt a typed record for upload.
///
/// The item key is the record's own raw id. Calling this on
/// [`StorageRecord::Unknown`] is a bug in the caller and fails with
/// [`SyncError::UnknownRecordWrite`]: unknown items are never re-uploaded.
pub fn local_to_remote_record<C: StorageCipher + ?Sized>(
    record: &StorageRecord,
    keys: &C,
) -> SyncResult<StorageItem> {
    let payload = match record {
        StorageRecord::Contact(r) => r.encode_payload(),
        StorageRecord::GroupV1(r) => r.encode_payload(),
        StorageRecord::GroupV2(r) => r.encode_payload(),
        StorageRecord::Account(r) => r.encode_payload(),
        StorageRecord::StoryDistributionList(r) => r.encode_payload(),
        StorageRecord::CallLink(r) => r.encode_payload(),
        StorageRecord::Unknown(id) => return Err(SyncError::UnknownRecordWrite(id.clone())),
    };

    let id = record.id();
    let plaintext = encode_len_field(id.id_type_raw() as u32, &payload);
    let value = keys.encrypt(&keys.item_key(id.raw()), &plaintext)?;
    debug!(%id, len = plaintext.len(), "Encrypted record");

    Ok(StorageItem {
        key: id.raw().to_vec(),
        value,
    })
}

/// The record field of an item envelope as `(field number, payload)`.
///
/// Fields with numbers outside the known kinds are skipped. If several known
/// kinds appear, the last one wins, matching protobuf oneof semantics.
fn find_record_payload(envelope: &[u8]) -> SyncResult<Option<(u32, &[u8])>> {
    let mut found = None;
    for field in FieldIter::new(envelope) {
        let field = field?;
        let known = i32::try_from(field.number)
            .ok()
            .and_then(StorageIdType::from_raw)
            .is_some();
        if !known {
            continue;
        }
        if field.wire_type != WIRE_LEN {
            return Err(SyncError::Decode(format!(
                "Record field {} has wire type {}, expected length-delimited",
                field.number, field.wire_type
            )));
        }
        found = Some((field.number, field.payload));
    }
    Ok(found)
}
