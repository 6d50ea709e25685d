//! Legacy (V1) group records

use tracing::debug;

use crate::error::SyncResult;
use crate::proto;
use crate::records::diff::FieldDiff;
use crate::types::StorageId;

/// Length of a V1 group id
pub const GROUP_V1_ID_LENGTH: usize = 16;

/// A legacy group, addressed by its 16-byte group id.
///
/// An id of any other length is reported as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupV1Record {
    id: StorageId,
    proto: proto::GroupV1Record,
    unknown_fields: Option<Vec<u8>>,
    group_id: Option<Vec<u8>>,
}

impl GroupV1Record {
    pub fn from_proto(
        raw_id: impl Into<Vec<u8>>,
        proto: proto::GroupV1Record,
        unknown_fields: Option<Vec<u8>>,
    ) -> Self {
        let id = StorageId::for_group_v1(raw_id);
        let group_id = Some(proto.id.clone()).filter(|g| g.len() == GROUP_V1_ID_LENGTH);
        if group_id.is_none() {
            debug!(%id, len = proto.id.len(), "GroupV1 id has wrong length, treating as absent");
        }
        Self {
            id,
            proto,
            unknown_fields,
            group_id,
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

    pub fn to_builder(&self) -> GroupV1RecordBuilder {
        GroupV1RecordBuilder {
            raw_id: self.id.raw().to_vec(),
            proto: self.proto.clone(),
            unknown_fields: self.unknown_fields.clone(),
        }
    }

    pub fn id(&self) -> &StorageId {
        &self.id
    }

    pub fn proto(&self) -> &proto::GroupV1Record {
        &self.proto
    }

    pub fn has_unknown_fields(&self) -> bool {
        self.unknown_fields.is_some()
    }

    pub fn unknown_fields(&self) -> Option<&[u8]> {
        self.unknown_fields.as_deref()
    }

    pub fn group_id(&self) -> Option<&[u8]> {
        self.group_id.as_deref()
    }

    pub fn is_blocked(&self) -> bool {
        self.proto.blocked
    }

    pub fn is_profile_sharing_enabled(&self) -> bool {
        self.proto.whitelisted
    }

    pub fn is_archived(&self) -> bool {
        self.proto.archived
    }

    pub fn is_forced_unread(&self) -> bool {
        self.proto.marked_unread
    }

    pub fn muted_until(&self) -> u64 {
        self.proto.muted_until_timestamp
    }

    pub fn describe_diff(&self, other: &GroupV1Record) -> Vec<&'static str> {
        FieldDiff::new()
            .field("id", &self.id, &other.id)
            .field("group_id", &self.group_id, &other.group_id)
            .field("blocked", &self.is_blocked(), &other.is_blocked())
            .field(
                "profile_sharing",
                &self.is_profile_sharing_enabled(),
                &other.is_profile_sharing_enabled(),
            )
            .field("archived", &self.is_archived(), &other.is_archived())
            .field("forced_unread", &self.is_forced_unread(), &other.is_forced_unread())
            .field("muted_until", &self.muted_until(), &other.muted_until())
            .field("unknown_fields", &self.unknown_fields, &other.unknown_fields)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GroupV1RecordBuilder {
    raw_id: Vec<u8>,
    proto: proto::GroupV1Record,
    unknown_fields: Option<Vec<u8>>,
}

impl GroupV1RecordBuilder {
    pub fn new(raw_id: impl Into<Vec<u8>>, group_id: &[u8]) -> Self {
        Self {
            raw_id: raw_id.into(),
            proto: proto::GroupV1Record {
                id: group_id.to_vec(),
                ..Default::default()
            },
            unknown_fields: None,
        }
    }

    /// Start from a previously captured unknown-field blob.
    ///
    /// `group_id` always wins over any id found in the blob.
    pub fn from_unknown_fields(
        raw_id: impl Into<Vec<u8>>,
        group_id: &[u8],
        unknown_fields: &[u8],
    ) -> SyncResult<Self> {
        let (mut proto, unknown_fields): (proto::GroupV1Record, _) =
            proto::decode_with_unknown(unknown_fields)?;
        proto.id = group_id.to_vec();
        Ok(Self {
            raw_id: raw_id.into(),
            proto,
            unknown_fields,
        })
    }

    pub fn with_blocked(mut self, blocked: bool) -> Self {
        self.proto.blocked = blocked;
        self
    }

    pub fn with_profile_sharing(mut self, enabled: bool) -> Self {
        self.proto.whitelisted = enabled;
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.proto.archived = archived;
        self
    }

    pub fn with_forced_unread(mut self, unread: bool) -> Self {
        self.proto.marked_unread = unread;
        self
    }

    pub fn with_muted_until(mut self, timestamp: u64) -> Self {
        self.proto.muted_until_timestamp = timestamp;
        self
    }

    pub fn build(self) -> GroupV1Record {
        GroupV1Record::from_proto(self.raw_id, self.proto, self.unknown_fields)
    }
}
