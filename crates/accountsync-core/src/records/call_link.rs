//! Call link records

use crate::error::SyncResult;
use crate::proto;
use crate::records::diff::FieldDiff;
use crate::records::non_empty_bytes;
use crate::types::StorageId;

/// A reusable call link. Only admins hold the passkey.
#[derive(Debug, Clone, PartialEq)]
pub struct CallLinkRecord {
    id: StorageId,
    proto: proto::CallLinkRecord,
    unknown_fields: Option<Vec<u8>>,
    root_key: Option<Vec<u8>>,
    admin_passkey: Option<Vec<u8>>,
}

impl CallLinkRecord {
    pub fn from_proto(
        raw_id: impl Into<Vec<u8>>,
        proto: proto::CallLinkRecord,
        unknown_fields: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: StorageId::for_call_link(raw_id),
            root_key: non_empty_bytes(&proto.root_key),
            admin_passkey: non_empty_bytes(&proto.admin_passkey),
            proto,
            unknown_fields,
        }
    }

    pub fn decode_payload(raw_id: impl Into<Vec<u8>>, payload: &[u8]) -> SyncResult<Self> {
        let (proto, unknown_fields) = proto::decode_with_unknown(payload)?;
        Ok(Self::from_proto(raw_id, proto, unknown_fields))
    }

    pub fn encode_payload(&self) -> Vec<u8> {
        proto::encode_with_unknown(&self.proto, self.unknown_fields.as_deref())
    }

    pub fn with_raw_id(&self, raw_id: impl Into<Vec<u8>>) -> Self {
        Self {
            id: self.id.with_new_bytes(raw_id),
            ..self.clone()
        }
    }

    pub fn to_builder(&self) -> CallLinkRecordBuilder {
        CallLinkRecordBuilder {
            raw_id: self.id.raw().to_vec(),
            proto: self.proto.clone(),
            unknown_fields: self.unknown_fields.clone(),
        }
    }

    pub fn id(&self) -> &StorageId {
        &self.id
    }

    pub fn proto(&self) -> &proto::CallLinkRecord {
        &self.proto
    }

    pub fn has_unknown_fields(&self) -> bool {
        self.unknown_fields.is_some()
    }

    pub fn unknown_fields(&self) -> Option<&[u8]> {
        self.unknown_fields.as_deref()
    }

    pub fn root_key(&self) -> Option<&[u8]> {
        self.root_key.as_deref()
    }

    pub fn admin_passkey(&self) -> Option<&[u8]> {
        self.admin_passkey.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.admin_passkey.is_some()
    }

    pub fn deleted_at(&self) -> u64 {
        self.proto.deleted_at_timestamp_ms
    }

    pub fn describe_diff(&self, other: &CallLinkRecord) -> Vec<&'static str> {
        FieldDiff::new()
            .field("id", &self.id, &other.id)
            .field("root_key", &self.root_key, &other.root_key)
            .field("admin_passkey", &self.admin_passkey, &other.admin_passkey)
            .field("deleted_at", &self.deleted_at(), &other.deleted_at())
            .field("unknown_fields", &self.unknown_fields, &other.unknown_fields)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CallLinkRecordBuilder {
    raw_id: Vec<u8>,
    proto: proto::CallLinkRecord,
    unknown_fields: Option<Vec<u8>>,
}

impl CallLinkRecordBuilder {
    pub fn new(raw_id: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_id: raw_id.into(),
            proto: proto::CallLinkRecord::default(),
            unknown_fields: None,
        }
    }

    pub fn from_unknown_fields(
        raw_id: impl Into<Vec<u8>>,
        unknown_fields: &[u8],
    ) -> SyncResult<Self> {
        let (proto, unknown_fields) = proto::decode_with_unknown(unknown_fields)?;
        Ok(Self {
            raw_id: raw_id.into(),
            proto,
            unknown_fields,
        })
    }

    pub fn with_root_key(mut self, root_key: &[u8]) -> Self {
        self.proto.root_key = root_key.to_vec();
        self
    }

    pub fn with_admin_passkey(mut self, passkey: Option<&[u8]>) -> Self {
        self.proto.admin_passkey = passkey.unwrap_or_default().to_vec();
        self
    }

    pub fn with_deleted_at(mut self, timestamp_ms: u64) -> Self {
        self.proto.deleted_at_timestamp_ms = timestamp_ms;
        self
    }

    pub fn build(self) -> CallLinkRecord {
        CallLinkRecord::from_proto(self.raw_id, self.proto, self.unknown_fields)
    }
}
